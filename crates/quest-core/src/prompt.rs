//! Prompt assembly and token budgeting.
//!
//! The construction order is fixed; the completion model is sensitive to it:
//! framing sentence, findings block (or no-search sentence), conversation so
//! far plus the pending user turn, persona guardrail, assistant cue.

use crate::conversation::Conversation;
use crate::{Error, Result};

/// Stop sequence passed to the completion collaborator so the model does not
/// invent the user's next turn.
pub const STOP_SEQUENCE: &str = "User:";

const FRAMING: &str = "You are a friendly and helpful AI assistant. You have access to the internet if the user runs a web search.\n";
const NO_SEARCH: &str = "The user did not run a web search to provide more information.\n";

/// Opaque token-count oracle. Must be a pure function of the input text.
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

/// Rough ~4 characters per token approximation for English text. Good enough
/// for budgeting; swap in a real tokenizer behind the trait if exact counts
/// matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    pub conversation: &'a Conversation,
    /// Finding texts for the most recent query, already capped by the caller.
    pub findings: &'a [String],
    /// The most recent query; `None` when no search was run this session.
    pub query: Option<&'a str>,
    /// The new user turn, not yet appended to the conversation.
    pub user_text: &'a str,
    pub max_total_tokens: usize,
}

#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub prompt: String,
    /// `max_total_tokens` minus the prompt's own token count.
    pub completion_budget: usize,
}

pub fn build_prompt(input: &PromptInput<'_>, counter: &dyn TokenCounter) -> Result<AssembledPrompt> {
    let mut prompt = String::from(FRAMING);

    match input.query {
        Some(query) if !input.findings.is_empty() => {
            prompt.push_str("The user asked you to search the web for:\n");
            prompt.push_str(query);
            prompt.push_str("\nYour findings are:\n");
            for finding in input.findings {
                prompt.push_str(finding);
                prompt.push('\n');
            }
        }
        _ => prompt.push_str(NO_SEARCH),
    }

    prompt.push_str("This is the conversation so far:\n");
    prompt.push_str(&input.conversation.transcript());
    prompt.push_str("User: ");
    prompt.push_str(input.user_text);
    prompt.push_str(input.conversation.persona().profile().guardrail);
    prompt.push_str("\nAssistant:");

    let needed = counter.count(&prompt);
    if needed >= input.max_total_tokens {
        return Err(Error::BudgetExceeded {
            needed,
            max: input.max_total_tokens,
        });
    }

    Ok(AssembledPrompt {
        completion_budget: input.max_total_tokens - needed,
        prompt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Persona;

    fn neutral_conversation() -> Conversation {
        Conversation::new(Persona::Neutral)
    }

    #[test]
    fn findings_block_precedes_conversation_and_prompt_ends_with_cue() {
        let mut conversation = neutral_conversation();
        conversation.append_user("hi");
        conversation.append_assistant("hello, what can I do for you?");

        let findings = vec!["cloudy, 15C".to_string()];
        let input = PromptInput {
            conversation: &conversation,
            findings: &findings,
            query: Some("weather"),
            user_text: "do I need a coat?",
            max_total_tokens: 4000,
        };
        let assembled = build_prompt(&input, &HeuristicTokenCounter).unwrap();

        let prompt = &assembled.prompt;
        assert!(prompt.ends_with("\nAssistant:"));
        let findings_at = prompt.find("weather").unwrap();
        let conversation_at = prompt.find("This is the conversation so far:").unwrap();
        assert!(findings_at < conversation_at);
        assert!(prompt.contains("cloudy, 15C"));
        assert!(prompt.contains("User: do I need a coat?"));
        // Guardrail sits between the pending turn and the cue.
        let guardrail_at = prompt.find("ATTENTION:").unwrap();
        assert!(guardrail_at > conversation_at);
        assert!(guardrail_at < prompt.rfind("\nAssistant:").unwrap());
    }

    #[test]
    fn no_findings_yields_the_fixed_no_search_sentence() {
        let conversation = neutral_conversation();
        let input = PromptInput {
            conversation: &conversation,
            findings: &[],
            query: None,
            user_text: "hello",
            max_total_tokens: 4000,
        };
        let assembled = build_prompt(&input, &HeuristicTokenCounter).unwrap();
        assert!(assembled.prompt.contains(NO_SEARCH));
        assert!(!assembled.prompt.contains("Your findings are:"));
    }

    #[test]
    fn a_query_with_no_findings_counts_as_no_search() {
        let conversation = neutral_conversation();
        let input = PromptInput {
            conversation: &conversation,
            findings: &[],
            query: Some("weather"),
            user_text: "hello",
            max_total_tokens: 4000,
        };
        let assembled = build_prompt(&input, &HeuristicTokenCounter).unwrap();
        assert!(assembled.prompt.contains(NO_SEARCH));
    }

    #[test]
    fn budget_is_never_zero_or_negative() {
        let conversation = neutral_conversation();
        let input = PromptInput {
            conversation: &conversation,
            findings: &[],
            query: None,
            user_text: "hello",
            max_total_tokens: 4000,
        };
        let assembled = build_prompt(&input, &HeuristicTokenCounter).unwrap();
        assert!(assembled.completion_budget > 0);
        assert!(assembled.completion_budget < 4000);
    }

    #[test]
    fn oversized_context_fails_with_budget_exceeded_not_truncation() {
        let mut conversation = neutral_conversation();
        for _ in 0..50 {
            conversation.append_user(&"long turn ".repeat(100));
        }
        let input = PromptInput {
            conversation: &conversation,
            findings: &[],
            query: None,
            user_text: "hello",
            max_total_tokens: 200,
        };
        match build_prompt(&input, &HeuristicTokenCounter) {
            Err(Error::BudgetExceeded { needed, max }) => {
                assert!(needed >= max);
                assert_eq!(max, 200);
            }
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }
    }

    #[test]
    fn an_exactly_full_prompt_is_rejected() {
        struct FixedCounter(usize);
        impl TokenCounter for FixedCounter {
            fn count(&self, _: &str) -> usize {
                self.0
            }
        }

        let conversation = neutral_conversation();
        let input = PromptInput {
            conversation: &conversation,
            findings: &[],
            query: None,
            user_text: "hello",
            max_total_tokens: 100,
        };
        // needed == max would leave a zero budget; that must fail.
        assert!(build_prompt(&input, &FixedCounter(100)).is_err());
        assert_eq!(
            build_prompt(&input, &FixedCounter(99))
                .unwrap()
                .completion_budget,
            1
        );
    }

    #[test]
    fn guardrail_is_absent_for_very_creative() {
        let conversation = Conversation::new(Persona::VeryCreative);
        let input = PromptInput {
            conversation: &conversation,
            findings: &[],
            query: None,
            user_text: "tell me a story",
            max_total_tokens: 4000,
        };
        let assembled = build_prompt(&input, &HeuristicTokenCounter).unwrap();
        assert!(!assembled.prompt.contains("WARNING:"));
        assert!(!assembled.prompt.contains("ATTENTION:"));
        assert!(assembled
            .prompt
            .ends_with("User: tell me a story\nAssistant:"));
    }
}
