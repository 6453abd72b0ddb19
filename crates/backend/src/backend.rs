use async_trait::async_trait;
use quiz_core::model::{AnsweredItem, DifficultyTier};
use quiz_core::pool::QuestionPool;
use thiserror::Error;

use crate::result::ResultSummary;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid question data: {0}")]
    InvalidPayload(#[from] quiz_core::Error),
}

/// Questions for one session plus the level to start at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolResponse {
    pub pool: QuestionPool,
    pub starting_level: DifficultyTier,
}

/// Contract for the remote assessment service.
///
/// The backend owns the question bank, scoring and persistence; the client only
/// fetches a pool and hands back the answers.
#[async_trait]
pub trait AssessmentBackend: Send + Sync {
    /// Fetch the question pool for the given topics. An empty slice means all
    /// topics.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the pool cannot be fetched or decoded.
    async fn fetch_pool(&self, topics: &[String]) -> Result<PoolResponse, BackendError>;

    /// Submit the answers of a finished session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the submission is not accepted.
    async fn submit(&self, answers: &[AnsweredItem]) -> Result<ResultSummary, BackendError>;
}
