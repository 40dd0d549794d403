//! Persona presets: a scripted preamble plus a guardrail sentence appended
//! near the end of every prompt.
//!
//! Ordering from strictly-factual to very-creative relaxes the guardrail
//! (down to empty) and shortens the preamble example set.

use crate::conversation::Speaker;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persona {
    StrictlyFactual,
    Factual,
    Neutral,
    Creative,
    VeryCreative,
}

#[derive(Debug, Clone, Copy)]
pub struct PersonaProfile {
    pub preamble: &'static [(Speaker, &'static str)],
    pub guardrail: &'static str,
}

const CODE_EXAMPLE_QUESTION: &str = "Can you show me how to loop between 0 and 9 in python?";
const CODE_EXAMPLE_ANSWER: &str = "Sure. Here's how you can loop between 0 and 9 in python:\n```python\nfor i in range(10):\n    print(i)\n```";

const PREAMBLE_STRICT: &[(Speaker, &'static str)] = &[
    (Speaker::User, "Who are you?"),
    (
        Speaker::Assistant,
        "Hello, my name is Assistant. How can I help you?",
    ),
    (Speaker::User, "How much is the toy car from my search?"),
    (
        Speaker::Assistant,
        "Unfortunately your web search did not specify prices for gifts, but based on your search, I do have some information about popular gifts for kids.",
    ),
    (Speaker::User, CODE_EXAMPLE_QUESTION),
    (Speaker::Assistant, CODE_EXAMPLE_ANSWER),
];

const PREAMBLE_GROUNDED: &[(Speaker, &'static str)] = &[
    (Speaker::User, "Who are you?"),
    (
        Speaker::Assistant,
        "Hello, my name is Assistant. How can I help you?",
    ),
    (Speaker::User, "How much is the toy car from my search?"),
    (
        Speaker::Assistant,
        "Unfortunately your web search did not specify prices for gifts, but I do have some information about popular gifts for kids.",
    ),
    (Speaker::User, CODE_EXAMPLE_QUESTION),
    (Speaker::Assistant, CODE_EXAMPLE_ANSWER),
];

const PREAMBLE_FREEFORM: &[(Speaker, &'static str)] = &[
    (Speaker::User, "Who are you?"),
    (
        Speaker::Assistant,
        "Hello, my name is Assistant. How can I help you?",
    ),
    (Speaker::User, CODE_EXAMPLE_QUESTION),
    (Speaker::Assistant, CODE_EXAMPLE_ANSWER),
];

const PROFILE_STRICTLY_FACTUAL: PersonaProfile = PersonaProfile {
    preamble: PREAMBLE_STRICT,
    guardrail: "\nWARNING: If the user asks for information that is not in their web search, try to answer the question as factually as possible and warn the user about this absence. DO NOT provide any hyperlinks.\n",
};

const PROFILE_FACTUAL: PersonaProfile = PersonaProfile {
    preamble: PREAMBLE_GROUNDED,
    guardrail: "\nWARNING: If the user asks for information that is not in their web search, try to answer the question but warn about potential lack of precise or up to date information. DO NOT provide any hyperlinks.\n",
};

const PROFILE_NEUTRAL: PersonaProfile = PersonaProfile {
    preamble: PREAMBLE_GROUNDED,
    guardrail: "\nATTENTION: If the user asks for information that is not in their web search, try to answer the question to the best of your knowledge but warn about potential lack of precise or up to date information.\n",
};

const PROFILE_CREATIVE: PersonaProfile = PersonaProfile {
    preamble: PREAMBLE_GROUNDED,
    guardrail: "\nATTENTION: If the user asks for information that is not in their web search, try to answer the question in a way that seems correct but warn about potential lack of precise or up to date information.\n",
};

const PROFILE_VERY_CREATIVE: PersonaProfile = PersonaProfile {
    preamble: PREAMBLE_FREEFORM,
    guardrail: "",
};

impl Persona {
    pub const ALL: [Persona; 5] = [
        Persona::StrictlyFactual,
        Persona::Factual,
        Persona::Neutral,
        Persona::Creative,
        Persona::VeryCreative,
    ];

    pub fn profile(self) -> PersonaProfile {
        match self {
            Persona::StrictlyFactual => PROFILE_STRICTLY_FACTUAL,
            Persona::Factual => PROFILE_FACTUAL,
            Persona::Neutral => PROFILE_NEUTRAL,
            Persona::Creative => PROFILE_CREATIVE,
            Persona::VeryCreative => PROFILE_VERY_CREATIVE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Persona::StrictlyFactual => "strictly-factual",
            Persona::Factual => "factual",
            Persona::Neutral => "neutral",
            Persona::Creative => "creative",
            Persona::VeryCreative => "very-creative",
        }
    }

    /// Parse a user-supplied persona name. Case-insensitive; spaces and
    /// underscores are treated as dashes.
    pub fn parse(s: &str) -> Option<Persona> {
        let norm = s
            .trim()
            .to_ascii_lowercase()
            .replace([' ', '_'], "-");
        Persona::ALL.into_iter().find(|p| p.name() == norm)
    }
}
