use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};
use url::Url;

use quiz_core::QuestionBank;
use quiz_core::model::{Question, QuestionRecord};

use crate::error::LoadError;

/// Where the question bank is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSource {
    Path(PathBuf),
    Url(Url),
}

impl BankSource {
    /// `http://` and `https://` values are fetched; anything else is a file path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            if let Ok(url) = Url::parse(trimmed) {
                return Self::Url(url);
            }
        }
        Self::Path(PathBuf::from(trimmed))
    }
}

impl fmt::Display for BankSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Load the question bank once. There is no retry.
///
/// # Errors
///
/// Returns `LoadError::Transport` when the file or server cannot be read,
/// `LoadError::HttpStatus` for a non-success response and
/// `LoadError::MalformedPayload` when the body is not a valid bank.
pub async fn load_bank(source: &BankSource) -> Result<QuestionBank, LoadError> {
    load_bank_with(&reqwest::Client::new(), source).await
}

/// [`load_bank`] over a caller-supplied HTTP client.
///
/// # Errors
///
/// Same as [`load_bank`].
pub async fn load_bank_with(
    client: &reqwest::Client,
    source: &BankSource,
) -> Result<QuestionBank, LoadError> {
    let transport = |message: String| LoadError::Transport {
        source_name: source.to_string(),
        message,
    };

    let bytes = match source {
        BankSource::Path(path) => std::fs::read(path).map_err(|err| transport(err.to_string()))?,
        BankSource::Url(url) => {
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|err| transport(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::HttpStatus(status));
            }
            response
                .bytes()
                .await
                .map_err(|err| transport(err.to_string()))?
                .to_vec()
        }
    };

    let bank = parse_bank(&bytes)?;
    info!(
        source = %source,
        questions = bank.len(),
        rounds = bank.rounds().len(),
        subjects = bank.subjects().len(),
        "question bank loaded"
    );
    Ok(bank)
}

/// Parse a JSON array of question records.
///
/// Records that parse but fail validation (no options, blank round) are
/// skipped with a warning.
///
/// # Errors
///
/// Returns `LoadError::MalformedPayload` when the payload is not a JSON array
/// of records.
pub fn parse_bank(bytes: &[u8]) -> Result<QuestionBank, LoadError> {
    let records: Vec<QuestionRecord> = serde_json::from_slice(bytes)?;
    let questions = records
        .into_iter()
        .filter_map(|record| match Question::from_record(record) {
            Ok(question) => Some(question),
            Err(err) => {
                warn!(%err, "skipping invalid question");
                None
            }
        })
        .collect();
    Ok(QuestionBank::new(questions))
}
