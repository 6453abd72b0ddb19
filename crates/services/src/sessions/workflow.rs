use std::sync::Arc;

use backend::{AssessmentBackend, ResultSummary};
use quiz_core::model::SessionSettings;
use rand::Rng;
use tracing::{info, warn};

use super::controller::{AdaptiveSessionController, SessionPhase};
use crate::Clock;
use crate::error::SessionError;

/// Orchestrates session start and submission against a backend.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    backend: Arc<dyn AssessmentBackend>,
    settings: SessionSettings,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, backend: Arc<dyn AssessmentBackend>) -> Self {
        Self {
            clock,
            backend,
            settings: SessionSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Fetch a pool for `topics` and start a session on it.
    ///
    /// The returned session is either awaiting its first answer or, for an
    /// empty pool, already `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Fetch` if the pool cannot be loaded.
    pub async fn start_session<R: Rng + ?Sized>(
        &self,
        topics: &[String],
        rng: &mut R,
    ) -> Result<AdaptiveSessionController, SessionError> {
        let mut session =
            AdaptiveSessionController::new(self.settings, topics.to_vec(), self.clock.now());

        let response = match self.backend.fetch_pool(topics).await {
            Ok(response) => response,
            Err(err) => {
                warn!(session_id = %session.id(), error = %err, "question pool unavailable");
                return Err(SessionError::Fetch(err));
            }
        };

        info!(
            session_id = %session.id(),
            topics = ?topics,
            questions = response.pool.total(),
            "question pool loaded"
        );
        session.start(response.pool, response.starting_level, rng)?;
        Ok(session)
    }

    /// Submit the session's answers and complete it.
    ///
    /// A session that already finished returns its stored result without
    /// contacting the backend again. On failure the session stays in
    /// `Submitting` so this can be called again with the same answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` if the session is still asking
    /// questions or was aborted, and `SessionError::Submit` if the backend
    /// rejects the submission.
    pub async fn submit(
        &self,
        session: &mut AdaptiveSessionController,
    ) -> Result<ResultSummary, SessionError> {
        if session.phase() == SessionPhase::Done {
            if let Some(result) = session.result() {
                return Ok(result.clone());
            }
        }

        let answers = session.pending_submission()?.to_vec();
        match self.backend.submit(&answers).await {
            Ok(result) => {
                session.complete(result.clone(), self.clock.now())?;
                Ok(result)
            }
            Err(err) => {
                session.record_submit_failure();
                warn!(
                    session_id = %session.id(),
                    attempts = session.submit_attempts(),
                    answers = answers.len(),
                    error = %err,
                    "submission failed"
                );
                Err(SessionError::Submit(err))
            }
        }
    }

    /// Retry a failed submission.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    pub async fn retry_submit(
        &self,
        session: &mut AdaptiveSessionController,
    ) -> Result<ResultSummary, SessionError> {
        self.submit(session).await
    }
}
