use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Identity of a question across the bank: exam round plus question number.
///
/// The subject is deliberately not part of the key. Persisted bookmarks and
/// notes are keyed as `"{round}-{number}"`, so two subjects of the same round
/// sharing a number also share a key.
///
/// Ordering is round-major (lexicographic) and then numeric on the number.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionKey {
    round: String,
    number: u32,
}

impl QuestionKey {
    #[must_use]
    pub fn new(round: impl Into<String>, number: u32) -> Self {
        Self {
            round: round.into(),
            number,
        }
    }

    #[must_use]
    pub fn round(&self) -> &str {
        &self.round
    }

    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Debug for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionKey({}-{})", self.round, self.number)
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.round, self.number)
    }
}

/// Error returned when a persisted key is not of the form `"{round}-{number}"`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid question key: {raw:?}")]
pub struct QuestionKeyParseError {
    raw: String,
}

impl FromStr for QuestionKey {
    type Err = QuestionKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || QuestionKeyParseError { raw: s.to_owned() };
        let (round, number) = s.rsplit_once('-').ok_or_else(err)?;
        if round.is_empty() {
            return Err(err());
        }
        let number = number.trim().parse::<u32>().map_err(|_| err())?;
        Ok(Self::new(round, number))
    }
}
