//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use studypace_core::model::{CategoryError, MaterialError, MaterialId};
use studypace_core::progress::ProgressError;

/// Errors emitted by `MaterialService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MaterialServiceError {
    /// Input was rejected; nothing was written.
    #[error(transparent)]
    Validation(#[from] studypace_core::Error),
    #[error("study material {0} not found")]
    NotFound(MaterialId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<MaterialError> for MaterialServiceError {
    fn from(e: MaterialError) -> Self {
        Self::Validation(e.into())
    }
}

impl From<CategoryError> for MaterialServiceError {
    fn from(e: CategoryError) -> Self {
        Self::Validation(e.into())
    }
}

impl From<ProgressError> for MaterialServiceError {
    fn from(e: ProgressError) -> Self {
        Self::Validation(e.into())
    }
}

impl MaterialServiceError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
