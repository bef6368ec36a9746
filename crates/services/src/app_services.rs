use std::sync::Arc;

use url::Url;

use storage::{QuizRecords, Storage};

use crate::bank_loader::{BankSource, load_bank};
use crate::error::AppServicesError;
use crate::sessions::QuizLoopService;

/// Assembles app-facing services over one storage backend and one bank.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the bank load fails.
    pub async fn new_sqlite(
        db_url: &str,
        bank_source: &BankSource,
        asset_base: Option<Url>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, bank_source, asset_base).await
    }

    /// Build services over an already opened backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Load` if the bank cannot be loaded.
    pub async fn from_storage(
        storage: Storage,
        bank_source: &BankSource,
        asset_base: Option<Url>,
    ) -> Result<Self, AppServicesError> {
        let bank = Arc::new(load_bank(bank_source).await?);
        let records = QuizRecords::new(Arc::clone(&storage.kv));
        let quiz_loop =
            Arc::new(QuizLoopService::new(bank, records).with_asset_base(asset_base));
        Ok(Self { quiz_loop })
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }
}
