//! Shared error types for the services crate.

use thiserror::Error;

use scent_core::model::{ProfileError, StageError, TrialError};
use storage::repository::StorageError;

/// Errors emitted by `AssessmentEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Trial(#[from] TrialError),
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
