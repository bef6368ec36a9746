use std::fmt;

use thiserror::Error;

/// Highest option number a question can carry.
pub const MAX_OPTIONS: u8 = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognised answer token: {raw:?}")]
pub struct AnswerParseError {
    raw: String,
}

impl AnswerParseError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// A 1-based option number in `1..=4`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnswerChoice(u8);

impl AnswerChoice {
    /// Builds a choice from an option number.
    ///
    /// Returns `None` when `n` is outside `1..=4`.
    #[must_use]
    pub fn new(n: u8) -> Option<Self> {
        (1..=MAX_OPTIONS).contains(&n).then_some(Self(n))
    }

    /// Parses an answer token from the question bank.
    ///
    /// Accepts an ASCII numeral `"1"`..`"4"` or one of the circled numerals
    /// `①`..`④`, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `AnswerParseError` for any other token.
    pub fn parse(raw: &str) -> Result<Self, AnswerParseError> {
        let token = raw.trim();
        let n = match token {
            "①" => Some(1),
            "②" => Some(2),
            "③" => Some(3),
            "④" => Some(4),
            _ => token.parse::<u8>().ok(),
        };
        n.and_then(Self::new).ok_or_else(|| AnswerParseError {
            raw: raw.to_owned(),
        })
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Zero-based position in an option array.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl fmt::Debug for AnswerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnswerChoice({})", self.0)
    }
}

impl fmt::Display for AnswerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
