use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::model::answer::{AnswerChoice, AnswerParseError, MAX_OPTIONS};
use crate::model::content::{Content, decode_commas};
use crate::model::key::QuestionKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {key} has no options")]
    NoOptions { key: QuestionKey },

    #[error("question {key} has an empty round")]
    EmptyRound { key: QuestionKey },
}

//
// ─── WIRE RECORD ───────────────────────────────────────────────────────────────
//

/// One entry of the question bank as it appears in `quiz_data.json`.
///
/// Numeric columns are sometimes exported as strings and sometimes as numbers,
/// so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "연월일", deserialize_with = "text_or_number")]
    pub round: String,
    #[serde(rename = "과목", deserialize_with = "text_or_number")]
    pub subject: String,
    #[serde(rename = "문제번호", deserialize_with = "question_number")]
    pub number: u32,
    #[serde(rename = "문제내용", default, deserialize_with = "text_or_number")]
    pub body: String,
    #[serde(rename = "보기", default, deserialize_with = "optional_text")]
    pub reference: Option<String>,
    #[serde(rename = "선택지1", default, deserialize_with = "optional_text")]
    pub option1: Option<String>,
    #[serde(rename = "선택지2", default, deserialize_with = "optional_text")]
    pub option2: Option<String>,
    #[serde(rename = "선택지3", default, deserialize_with = "optional_text")]
    pub option3: Option<String>,
    #[serde(rename = "선택지4", default, deserialize_with = "optional_text")]
    pub option4: Option<String>,
    #[serde(rename = "정답", default, deserialize_with = "text_or_number")]
    pub answer: String,
    #[serde(rename = "해설", default, deserialize_with = "optional_text")]
    pub explanation: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_text)
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

fn question_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = text_or_number(deserializer)?;
    raw.trim()
        .parse::<u32>()
        .map_err(|_| serde::de::Error::custom(format!("invalid question number: {raw:?}")))
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated, immutable multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    key: QuestionKey,
    subject: String,
    body: String,
    reference: Option<Content>,
    options: [Option<Content>; MAX_OPTIONS as usize],
    answer: String,
    explanation: Option<String>,
}

impl Question {
    /// Validate a wire record.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyRound` when the round is blank and
    /// `QuestionError::NoOptions` when none of the four options has content.
    pub fn from_record(record: QuestionRecord) -> Result<Self, QuestionError> {
        let key = QuestionKey::new(record.round.trim(), record.number);
        if key.round().is_empty() {
            return Err(QuestionError::EmptyRound { key });
        }

        let options = [
            record.option1,
            record.option2,
            record.option3,
            record.option4,
        ]
        .map(|raw| raw.as_deref().and_then(Content::parse));
        if options.iter().all(Option::is_none) {
            return Err(QuestionError::NoOptions { key });
        }

        Ok(Self {
            key,
            subject: record.subject.trim().to_owned(),
            body: record.body,
            reference: record.reference.as_deref().and_then(Content::parse),
            options,
            answer: record.answer,
            explanation: record
                .explanation
                .filter(|text| !text.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn key(&self) -> &QuestionKey {
        &self.key
    }

    #[must_use]
    pub fn round(&self) -> &str {
        self.key.round()
    }

    #[must_use]
    pub fn number(&self) -> u32 {
        self.key.number()
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Raw body as stored in the bank.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Body with commas restored for display.
    #[must_use]
    pub fn display_body(&self) -> String {
        decode_commas(&self.body)
    }

    #[must_use]
    pub fn reference(&self) -> Option<&Content> {
        self.reference.as_ref()
    }

    /// Option content by 1-based choice.
    #[must_use]
    pub fn option(&self, choice: AnswerChoice) -> Option<&Content> {
        self.options[choice.index()].as_ref()
    }

    /// Present options paired with their choice number, in order.
    pub fn options(&self) -> impl Iterator<Item = (AnswerChoice, &Content)> {
        (1..=MAX_OPTIONS).filter_map(|n| {
            let choice = AnswerChoice::new(n)?;
            self.option(choice).map(|content| (choice, content))
        })
    }

    /// Raw answer token.
    #[must_use]
    pub fn answer_token(&self) -> &str {
        &self.answer
    }

    /// Parsed correct choice.
    ///
    /// # Errors
    ///
    /// Returns `AnswerParseError` when the token is not a recognised numeral.
    pub fn correct_choice(&self) -> Result<AnswerChoice, AnswerParseError> {
        AnswerChoice::parse(&self.answer)
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Full identity used to tell two questions apart within a session.
    #[must_use]
    pub fn is_same_as(&self, other: &Question) -> bool {
        self.key == other.key && self.subject == other.subject
    }
}
