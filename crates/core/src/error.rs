use thiserror::Error;

use crate::model::{ConfigError, ProfileError, ScoreError, StageError, TrialError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Trial(#[from] TrialError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Stage(#[from] StageError),
}
