use std::sync::Arc;

use storage::repository::Storage;
use studypace_core::progress::TokenPolicy;

use crate::Clock;
use crate::error::AppServicesError;
use crate::material_service::MaterialService;

/// Assembles app-facing services over one injected store.
#[derive(Clone)]
pub struct AppServices {
    materials: Arc<MaterialService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        token_policy: TokenPolicy,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, token_policy))
    }

    /// Build services over an already constructed store.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, token_policy: TokenPolicy) -> Self {
        let materials = Arc::new(
            MaterialService::new(clock, Arc::clone(&storage.materials))
                .with_token_policy(token_policy),
        );
        Self { materials }
    }

    #[must_use]
    pub fn materials(&self) -> Arc<MaterialService> {
        Arc::clone(&self.materials)
    }
}
