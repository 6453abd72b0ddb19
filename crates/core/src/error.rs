use thiserror::Error;

use crate::model::{QuestionError, SettingsError, TierParseError};
use crate::pool::PoolError;

/// Any validation failure raised while building domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Tier(#[from] TierParseError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
