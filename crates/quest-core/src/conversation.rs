//! Append-only conversation log seeded with the active persona's scripted
//! preamble. Changing persona discards the whole log and re-seeds it; history
//! is intentionally not preserved across persona changes.

use crate::persona::Persona;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => "Assistant",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Speaker::User => "👤",
            Speaker::Assistant => "🖥️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    /// `"User: ..."` / `"Assistant: ..."`, the form prompts are built from.
    pub fn render_raw(&self) -> String {
        format!("{}: {}", self.speaker.label(), self.text)
    }
}

/// Escape characters the markdown-ish renderer would otherwise interpret.
/// Display-only; prompt construction always uses raw text.
pub fn escape_markdown_literal(s: &str) -> String {
    s.replace('$', "\\$")
}

#[derive(Debug, Clone)]
pub struct Conversation {
    persona: Persona,
    turns: Vec<Turn>,
    preamble_len: usize,
}

impl Conversation {
    pub fn new(persona: Persona) -> Self {
        let mut conversation = Self {
            persona,
            turns: Vec::new(),
            preamble_len: 0,
        };
        conversation.reset(persona);
        conversation
    }

    /// Replace the whole log with `persona`'s preamble.
    pub fn reset(&mut self, persona: Persona) {
        let preamble = persona.profile().preamble;
        self.persona = persona;
        self.turns = preamble
            .iter()
            .map(|(speaker, text)| Turn::new(*speaker, *text))
            .collect();
        self.preamble_len = preamble.len();
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn preamble_len(&self) -> usize {
        self.preamble_len
    }

    /// Byte-exact prefix check of the log against `persona`'s script.
    pub fn preamble_matches(&self, persona: Persona) -> bool {
        let preamble = persona.profile().preamble;
        self.turns.len() >= preamble.len()
            && self
                .turns
                .iter()
                .zip(preamble.iter())
                .all(|(turn, (speaker, text))| turn.speaker == *speaker && turn.text == *text)
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::new(Speaker::User, text));
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::new(Speaker::Assistant, text));
    }

    /// Every turn (preamble included) rendered raw, one per line, with a
    /// trailing newline. This is the prompt-facing view.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            out.push_str(&turn.render_raw());
            out.push('\n');
        }
        out
    }

    /// Display-ready lines for the UI: preamble excluded, speaker icons
    /// prepended, markdown-sensitive characters escaped.
    pub fn render(&self) -> Vec<String> {
        self.turns[self.preamble_len..]
            .iter()
            .map(|turn| {
                format!(
                    "{}{}: {}",
                    turn.speaker.icon(),
                    turn.speaker.label(),
                    escape_markdown_literal(&turn.text)
                )
            })
            .collect()
    }
}
