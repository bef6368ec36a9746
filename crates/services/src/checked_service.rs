use serde_json::Value;
use tracing::info;

use quiz_core::model::{CheckedSet, QuestionKey};
use storage::records::{
    ObjectParseError, checked_from_object, checked_removals_from_object, checked_to_object,
    parse_object,
};
use storage::{QuizRecords, StorageError};

use crate::error::ImportError;

/// How an import combines with the bookmarks already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Replace the stored set.
    Overwrite,
    /// Apply on top of the stored set: `true` adds, `false` removes.
    Merge,
}

/// Bookmarked ("checked") questions. Every mutation is written through.
#[derive(Clone)]
pub struct CheckedService {
    records: QuizRecords,
}

impl CheckedService {
    #[must_use]
    pub fn new(records: QuizRecords) -> Self {
        Self { records }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn checked(&self) -> Result<CheckedSet, StorageError> {
        self.records.checked().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn is_checked(&self, key: &QuestionKey) -> Result<bool, StorageError> {
        Ok(self.records.checked().await?.contains(key))
    }

    /// Flip the bookmark and return the new state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read or stored.
    pub async fn toggle(&self, key: &QuestionKey) -> Result<bool, StorageError> {
        let mut set = self.records.checked().await?;
        let now_checked = set.toggle(key);
        self.records.save_checked(&set).await?;
        Ok(now_checked)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read or stored.
    pub async fn set(&self, key: &QuestionKey, checked: bool) -> Result<(), StorageError> {
        let mut set = self.records.checked().await?;
        set.set(key, checked);
        self.records.save_checked(&set).await
    }

    /// Pretty-printed `{ "round-number": true }` object, or `None` when there
    /// is nothing bookmarked.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read or encoded.
    pub async fn export(&self) -> Result<Option<String>, StorageError> {
        let set = self.records.checked().await?;
        if set.is_empty() {
            return Ok(None);
        }
        serde_json::to_string_pretty(&Value::Object(checked_to_object(&set)))
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Import an exported object and return how many bookmarks it carried.
    ///
    /// Malformed keys and non-boolean values are skipped. In merge mode a
    /// `false` entry drops that bookmark; overwrite mode ignores them.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Json` / `ImportError::NotAnObject` for bad input
    /// (nothing is written) and `ImportError::Storage` on backend failures.
    pub async fn import(&self, text: &str, mode: ImportMode) -> Result<usize, ImportError> {
        let map = parse_object(text).map_err(|err| match err {
            ObjectParseError::Json(err) => ImportError::Json(err),
            ObjectParseError::NotAnObject => ImportError::NotAnObject,
        })?;
        let imported = checked_from_object(&map);
        let count = imported.len();

        let set = match mode {
            ImportMode::Overwrite => imported,
            ImportMode::Merge => {
                let mut set = self.records.checked().await?;
                set.merge(imported);
                for key in checked_removals_from_object(&map) {
                    set.remove(&key);
                }
                set
            }
        };
        self.records.save_checked(&set).await?;
        info!(count, ?mode, total = set.len(), "checked questions imported");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storage::InMemoryStore;

    fn service() -> CheckedService {
        CheckedService::new(QuizRecords::new(Arc::new(InMemoryStore::new())))
    }

    #[tokio::test]
    async fn toggle_writes_through() {
        let svc = service();
        let key = QuestionKey::new("20240101", 3);
        assert!(svc.toggle(&key).await.unwrap());
        assert!(svc.is_checked(&key).await.unwrap());
        assert!(!svc.toggle(&key).await.unwrap());
        assert!(!svc.is_checked(&key).await.unwrap());
    }

    #[tokio::test]
    async fn export_is_none_when_empty() {
        let svc = service();
        assert_eq!(svc.export().await.unwrap(), None);

        svc.set(&QuestionKey::new("20240101", 1), true).await.unwrap();
        let text = svc.export().await.unwrap().unwrap();
        assert!(text.contains("\"20240101-1\": true"));
    }

    #[tokio::test]
    async fn import_merge_keeps_existing() {
        let svc = service();
        svc.set(&QuestionKey::new("20231201", 9), true).await.unwrap();

        let count = svc
            .import(r#"{"20240101-1": true, "20240101-2": false, "junk": true}"#, ImportMode::Merge)
            .await
            .unwrap();
        assert_eq!(count, 1);
        let set = svc.checked().await.unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&QuestionKey::new("20231201", 9)));
    }

    #[tokio::test]
    async fn import_merge_false_entry_removes_bookmark() {
        let svc = service();
        svc.set(&QuestionKey::new("20240101", 1), true).await.unwrap();
        svc.set(&QuestionKey::new("20231201", 9), true).await.unwrap();

        let count = svc
            .import(r#"{"20240101-1": false, "20240101-5": true}"#, ImportMode::Merge)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(!svc.is_checked(&QuestionKey::new("20240101", 1)).await.unwrap());
        assert!(svc.is_checked(&QuestionKey::new("20231201", 9)).await.unwrap());
        assert!(svc.is_checked(&QuestionKey::new("20240101", 5)).await.unwrap());
    }

    #[tokio::test]
    async fn import_overwrite_replaces() {
        let svc = service();
        svc.set(&QuestionKey::new("20231201", 9), true).await.unwrap();

        svc.import(r#"{"20240101-1": true}"#, ImportMode::Overwrite)
            .await
            .unwrap();
        let set = svc.checked().await.unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&QuestionKey::new("20240101", 1)));
    }

    #[tokio::test]
    async fn import_rejects_non_objects_without_writing() {
        let svc = service();
        svc.set(&QuestionKey::new("20231201", 9), true).await.unwrap();

        let err = svc.import("[1, 2]", ImportMode::Overwrite).await.unwrap_err();
        assert!(matches!(err, ImportError::NotAnObject));
        let err = svc.import("{oops", ImportMode::Overwrite).await.unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));

        assert_eq!(svc.checked().await.unwrap().len(), 1);
    }
}
