//! Typed accessors for the four records the quiz keeps in the key-value store.
//!
//! Stored values that fail to parse are treated as their default and logged;
//! a corrupted record must never stop the app. Backend failures still
//! propagate as `StorageError`.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use quiz_core::model::{CheckedResume, CheckedSet, ExplanationNotes, NormalResume, QuestionKey};

use crate::repository::{KeyValueStore, StorageError};

/// Keys of the persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    CheckedQuestions,
    LastQuizState,
    LastCheckedQuizState,
    TemporaryExplanations,
}

impl RecordKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckedQuestions => "checkedQuestions",
            Self::LastQuizState => "lastQuizState",
            Self::LastCheckedQuizState => "lastCheckedQuizState",
            Self::TemporaryExplanations => "temporaryExplanations",
        }
    }
}

//
// ─── ENCODING ──────────────────────────────────────────────────────────────────
//

/// Why a stored object could not be read.
#[derive(Debug)]
pub enum ObjectParseError {
    Json(serde_json::Error),
    NotAnObject,
}

/// Parse text that must hold a JSON object.
///
/// # Errors
///
/// Returns `ObjectParseError` when the text is not JSON or not an object.
pub fn parse_object(raw: &str) -> Result<Map<String, Value>, ObjectParseError> {
    match serde_json::from_str::<Value>(raw).map_err(ObjectParseError::Json)? {
        Value::Object(map) => Ok(map),
        _ => Err(ObjectParseError::NotAnObject),
    }
}

/// Build a checked set from a `{ "round-number": true }` object.
///
/// Entries with malformed keys or non-`true` values are skipped.
#[must_use]
pub fn checked_from_object(map: &Map<String, Value>) -> CheckedSet {
    map.iter()
        .filter_map(|(raw_key, value)| {
            if value != &Value::Bool(true) {
                return None;
            }
            match raw_key.parse::<QuestionKey>() {
                Ok(key) => Some(key),
                Err(err) => {
                    warn!(%err, "skipping checked entry");
                    None
                }
            }
        })
        .collect()
}

/// Keys whose value is `false`: bookmarks an import asks to drop.
#[must_use]
pub fn checked_removals_from_object(map: &Map<String, Value>) -> Vec<QuestionKey> {
    map.iter()
        .filter(|(_, value)| **value == Value::Bool(false))
        .filter_map(|(raw_key, _)| match raw_key.parse::<QuestionKey>() {
            Ok(key) => Some(key),
            Err(err) => {
                warn!(%err, "skipping checked removal");
                None
            }
        })
        .collect()
}

#[must_use]
pub fn checked_to_object(set: &CheckedSet) -> Map<String, Value> {
    set.iter()
        .map(|key| (key.to_string(), Value::Bool(true)))
        .collect()
}

fn notes_from_object(map: Map<String, Value>) -> ExplanationNotes {
    let mut notes = ExplanationNotes::new();
    for (raw_key, value) in map {
        let Value::String(text) = value else {
            warn!(key = %raw_key, "skipping non-text explanation entry");
            continue;
        };
        match raw_key.parse::<QuestionKey>() {
            Ok(key) => notes.insert_stored(key, text),
            Err(err) => warn!(%err, "skipping explanation entry"),
        }
    }
    notes
}

fn notes_to_object(notes: &ExplanationNotes) -> Map<String, Value> {
    notes
        .iter_stored()
        .map(|(key, text)| (key.to_string(), Value::String(text.to_owned())))
        .collect()
}

//
// ─── ADAPTER ───────────────────────────────────────────────────────────────────
//

/// Persistence adapter over a generic key-value store.
#[derive(Clone)]
pub struct QuizRecords {
    store: Arc<dyn KeyValueStore>,
}

impl QuizRecords {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_object(&self, key: RecordKey) -> Result<Option<Map<String, Value>>, StorageError> {
        let Some(raw) = self.store.get(key.as_str()).await? else {
            return Ok(None);
        };
        match parse_object(&raw) {
            Ok(map) => Ok(Some(map)),
            Err(ObjectParseError::Json(err)) => {
                warn!(record = key.as_str(), %err, "stored record is not valid JSON; using default");
                Ok(None)
            }
            Err(ObjectParseError::NotAnObject) => {
                warn!(record = key.as_str(), "stored record is not an object; using default");
                Ok(None)
            }
        }
    }

    async fn write_object(&self, key: RecordKey, map: Map<String, Value>) -> Result<(), StorageError> {
        let raw = Value::Object(map).to_string();
        self.store.set(key.as_str(), &raw).await
    }

    async fn read_typed<T>(&self, key: RecordKey) -> Result<Option<T>, StorageError>
    where
        T: serde::de::DeserializeOwned,
    {
        let Some(map) = self.read_object(key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(Value::Object(map)) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                warn!(record = key.as_str(), %err, "stored record has the wrong shape; ignoring it");
                Ok(None)
            }
        }
    }

    async fn write_typed<T>(&self, key: RecordKey, value: &T) -> Result<(), StorageError>
    where
        T: serde::Serialize,
    {
        let raw = serde_json::to_string(value)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.store.set(key.as_str(), &raw).await
    }

    // ─── checked questions ───

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn checked(&self) -> Result<CheckedSet, StorageError> {
        Ok(self
            .read_object(RecordKey::CheckedQuestions)
            .await?
            .map(|map| checked_from_object(&map))
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    pub async fn save_checked(&self, set: &CheckedSet) -> Result<(), StorageError> {
        self.write_object(RecordKey::CheckedQuestions, checked_to_object(set))
            .await
    }

    // ─── resume pointers ───

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn last_quiz(&self) -> Result<Option<NormalResume>, StorageError> {
        self.read_typed(RecordKey::LastQuizState).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    pub async fn save_last_quiz(&self, state: &NormalResume) -> Result<(), StorageError> {
        self.write_typed(RecordKey::LastQuizState, state).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn clear_last_quiz(&self) -> Result<(), StorageError> {
        self.store.remove(RecordKey::LastQuizState.as_str()).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn last_checked_quiz(&self) -> Result<Option<CheckedResume>, StorageError> {
        self.read_typed(RecordKey::LastCheckedQuizState).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    pub async fn save_last_checked_quiz(&self, state: &CheckedResume) -> Result<(), StorageError> {
        self.write_typed(RecordKey::LastCheckedQuizState, state)
            .await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn clear_last_checked_quiz(&self) -> Result<(), StorageError> {
        self.store
            .remove(RecordKey::LastCheckedQuizState.as_str())
            .await
    }

    // ─── temporary explanations ───

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn explanations(&self) -> Result<ExplanationNotes, StorageError> {
        Ok(self
            .read_object(RecordKey::TemporaryExplanations)
            .await?
            .map(notes_from_object)
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the notes cannot be stored.
    pub async fn save_explanations(&self, notes: &ExplanationNotes) -> Result<(), StorageError> {
        self.write_object(RecordKey::TemporaryExplanations, notes_to_object(notes))
            .await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn clear_explanations(&self) -> Result<(), StorageError> {
        self.store
            .remove(RecordKey::TemporaryExplanations.as_str())
            .await
    }
}
