//! Shared error types for the services crate.

use thiserror::Error;

use storage::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while loading the question bank. A failed load is final for
/// that attempt; nothing retries it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("could not read the question bank from {source_name}: {message}. Check the network connection or the file path")]
    Transport {
        source_name: String,
        message: String,
    },
    #[error("question bank request failed with status {0}. Check that the file is served from the expected location")]
    HttpStatus(reqwest::StatusCode),
    #[error("question bank is not valid JSON ({0}). Open the file and fix the syntax error")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Missing quiz criteria.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("select a round")]
    NoRoundSelected,
    #[error("select at least one subject")]
    NoSubjectSelected,
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("no questions match the selected criteria")]
    EmptySet,
    #[error("answer or reveal the current question first")]
    Unanswered,
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("question already answered")]
    AlreadyAnswered,
    #[error("option {0} is not available for this question")]
    InvalidOption(u8),
    #[error("session already completed")]
    Completed,
    #[error("there is no saved quiz to continue")]
    NoResumeState,
    #[error("the saved quiz no longer matches any questions; start a new one")]
    ResumeDataMissing,
    #[error("there are no incorrect questions to review")]
    NoIncorrectQuestions,
    #[error("there is no next round")]
    NoNextRound,
    #[error("next round {round} has no questions for the selected subjects")]
    NextRoundEmpty { round: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted when importing a checked-question export.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("import is not valid JSON: {0}")]
    Json(serde_json::Error),
    #[error("import must be a JSON object of question keys")]
    NotAnObject,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Load(#[from] LoadError),
}
