//! Shared error types for the services crate.

use backend::BackendError;
use thiserror::Error;

use crate::sessions::SessionPhase;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("could not load questions: {0}")]
    Fetch(#[source] BackendError),

    #[error("could not submit answers: {0}")]
    Submit(#[source] BackendError),

    #[error("option {index} does not exist; question has {len} options")]
    InvalidOption { index: usize, len: usize },

    #[error("session is {actual:?}, expected {expected:?}")]
    InvalidPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
}
