use quiz_core::model::{NoteChange, QuestionKey};
use storage::{QuizRecords, StorageError};

/// Learner-written notes kept alongside the bank's own explanations.
#[derive(Clone)]
pub struct ExplanationService {
    records: QuizRecords,
}

impl ExplanationService {
    #[must_use]
    pub fn new(records: QuizRecords) -> Self {
        Self { records }
    }

    /// Save a note; blank text deletes it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the notes cannot be read or stored.
    pub async fn save(&self, key: QuestionKey, text: &str) -> Result<NoteChange, StorageError> {
        let mut notes = self.records.explanations().await?;
        let change = notes.save(key, text);
        self.records.save_explanations(&notes).await?;
        Ok(change)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn get(&self, key: &QuestionKey) -> Result<Option<String>, StorageError> {
        Ok(self.records.explanations().await?.get(key))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn export(&self) -> Result<Option<String>, StorageError> {
        Ok(self.records.explanations().await?.export_text())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.records.clear_explanations().await
    }
}
