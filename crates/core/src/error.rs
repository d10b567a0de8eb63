use thiserror::Error;

use crate::model::{CategoryError, MaterialError};
use crate::progress::ProgressError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
