//! Keyword rules evaluated before a message reaches the LLM.
//!
//! Precedence: greeting > calculation keyword > too short > LLM.

use crate::replies::{CALCULATION_TEXT, TOO_SHORT_TEXT, WELCOME_TEXT};

/// Exact (case-insensitive) greeting tokens.
pub const GREETINGS: &[&str] = &["start", "شروع", "hello", "hi", "السلام علیکم"];

/// Case-insensitive substrings that ask for a tax calculation.
pub const CALCULATION_KEYWORDS: &[&str] = &["calculate", "حساب", "tax kitna", "کتنا ٹیکس"];

/// Messages with fewer characters than this get the too-short prompt.
pub const MIN_MESSAGE_CHARS: usize = 3;

/// Outcome of routing one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Welcome,
    CalculationPrompt,
    TooShort,
    /// No rule matched; forward to the LLM.
    Llm,
}

impl RuleOutcome {
    /// Fixed reply for rule matches, `None` for the LLM path.
    pub const fn fixed_reply(self) -> Option<&'static str> {
        match self {
            Self::Welcome => Some(WELCOME_TEXT),
            Self::CalculationPrompt => Some(CALCULATION_TEXT),
            Self::TooShort => Some(TOO_SHORT_TEXT),
            Self::Llm => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::CalculationPrompt => "calculation_prompt",
            Self::TooShort => "too_short",
            Self::Llm => "llm",
        }
    }
}

/// Route a (trimmed) message.
pub fn route(text: &str) -> RuleOutcome {
    let lowered = text.to_lowercase();

    if GREETINGS.iter().any(|g| *g == lowered) {
        return RuleOutcome::Welcome;
    }

    if CALCULATION_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return RuleOutcome::CalculationPrompt;
    }

    if text.chars().count() < MIN_MESSAGE_CHARS {
        return RuleOutcome::TooShort;
    }

    RuleOutcome::Llm
}
