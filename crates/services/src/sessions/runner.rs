//! Drives a session in real time: countdown ticks, answers from the user and
//! the adapting pause, all funnelled into one controller.

use std::time::Duration;

use backend::ResultSummary;
use quiz_core::model::{DifficultyTier, SessionId, SessionReport, Termination};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::controller::{
    AbortReason, AdaptiveSessionController, Advance, AnswerOutcome, RecordedAnswer, SessionPhase,
    TickOutcome,
};
use super::view::QuestionView;
use super::workflow::SessionLoopService;
use crate::error::SessionError;

const ANSWER_BUFFER: usize = 16;

/// Everything the presentation layer needs to render a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started {
        session_id: SessionId,
        questions: usize,
        starting_level: DifficultyTier,
    },
    Question(QuestionView),
    Tick {
        remaining: u32,
    },
    Answered(RecordedAnswer),
    /// The answer named an option the question does not have.
    Rejected {
        index: usize,
        len: usize,
    },
    Submitting {
        answered: usize,
        termination: Termination,
    },
    SubmitFailed {
        attempts: u32,
        error: String,
    },
    Finished {
        result: ResultSummary,
        report: Option<SessionReport>,
    },
    Aborted {
        reason: AbortReason,
    },
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(Box<AdaptiveSessionController>),
    /// Answers are kept; retry with [`SessionLoopService::retry_submit`].
    SubmitFailed {
        session: Box<AdaptiveSessionController>,
        error: SessionError,
    },
    Cancelled,
}

/// The caller's side of a running session.
#[derive(Debug)]
pub struct SessionHandle {
    answers: mpsc::Sender<usize>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    /// Send a 0-based option index. Returns `false` once the runner is gone.
    pub async fn answer(&self, index: usize) -> bool {
        self.answers.send(index).await.is_ok()
    }

    #[must_use]
    pub fn answer_sender(&self) -> mpsc::Sender<usize> {
        self.answers.clone()
    }

    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Tear the session down; pending timers and the adapting pause are dropped.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

enum Input {
    Answer(usize),
    Tick,
    Cancel,
}

pub struct SessionRunner {
    service: SessionLoopService,
    rng: StdRng,
    answers: mpsc::Receiver<usize>,
    events: mpsc::UnboundedSender<SessionEvent>,
    shutdown: CancellationToken,
}

impl SessionRunner {
    #[must_use]
    pub fn new(service: SessionLoopService, rng: StdRng) -> (Self, SessionHandle) {
        let (answer_tx, answer_rx) = mpsc::channel(ANSWER_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let runner = Self {
            service,
            rng,
            answers: answer_rx,
            events: event_tx,
            shutdown: shutdown.clone(),
        };
        let handle = SessionHandle {
            answers: answer_tx,
            events: event_rx,
            shutdown,
        };
        (runner, handle)
    }

    /// Runner with a deterministic question order.
    #[must_use]
    pub fn with_seed(service: SessionLoopService, seed: u64) -> (Self, SessionHandle) {
        Self::new(service, StdRng::seed_from_u64(seed))
    }

    /// Run one session to completion, submission failure or cancellation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Fetch` if the pool cannot be loaded; an
    /// `Aborted` event is emitted first.
    pub async fn run(mut self, topics: &[String]) -> Result<RunOutcome, SessionError> {
        let started = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => None,
            started = self.service.start_session(topics, &mut self.rng) => Some(started),
        };

        let mut session = match started {
            Some(Ok(session)) => session,
            None => {
                self.emit(SessionEvent::Aborted {
                    reason: AbortReason::Cancelled,
                });
                return Ok(RunOutcome::Cancelled);
            }
            Some(Err(err)) => {
                self.emit(SessionEvent::Aborted {
                    reason: AbortReason::FetchFailed,
                });
                return Err(err);
            }
        };

        self.emit(SessionEvent::Started {
            session_id: session.id(),
            questions: session.pool().total(),
            starting_level: session.state().level(),
        });

        let settings = *session.settings();
        let period = Duration::from_millis(settings.tick_ms());
        let adapting = Duration::from_millis(settings.adapting_ms());
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.present(&session, &mut ticker);

        loop {
            match session.phase() {
                SessionPhase::AwaitingAnswer => {
                    let input = tokio::select! {
                        biased;
                        () = self.shutdown.cancelled() => Input::Cancel,
                        answer = self.answers.recv() => answer.map_or(Input::Cancel, Input::Answer),
                        _ = ticker.tick() => Input::Tick,
                    };
                    match input {
                        Input::Cancel => return Ok(self.cancel(&mut session)),
                        Input::Answer(index) => self.on_answer(&mut session, index)?,
                        Input::Tick => self.on_tick(&mut session),
                    }
                }
                SessionPhase::Adapting => {
                    let cancelled = tokio::select! {
                        biased;
                        () = self.shutdown.cancelled() => true,
                        () = sleep(adapting) => false,
                    };
                    if cancelled {
                        return Ok(self.cancel(&mut session));
                    }
                    self.discard_queued(&mut session);
                    if let Advance::Question(_) = session.advance(&mut self.rng)? {
                        self.present(&session, &mut ticker);
                    }
                }
                SessionPhase::Loading
                | SessionPhase::Submitting
                | SessionPhase::Done
                | SessionPhase::Aborted => break,
            }
        }

        self.finish(session).await
    }

    async fn finish(
        &mut self,
        mut session: AdaptiveSessionController,
    ) -> Result<RunOutcome, SessionError> {
        if let Some(termination) = session.termination() {
            self.emit(SessionEvent::Submitting {
                answered: session.answers().len(),
                termination,
            });
        }

        let submitted = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => None,
            submitted = self.service.submit(&mut session) => Some(submitted),
        };

        match submitted {
            None => Ok(self.cancel(&mut session)),
            Some(Ok(result)) => {
                self.emit(SessionEvent::Finished {
                    result,
                    report: session.report(),
                });
                Ok(RunOutcome::Completed(Box::new(session)))
            }
            Some(Err(error @ SessionError::Submit(_))) => {
                self.emit(SessionEvent::SubmitFailed {
                    attempts: session.submit_attempts(),
                    error: error.to_string(),
                });
                Ok(RunOutcome::SubmitFailed {
                    session: Box::new(session),
                    error,
                })
            }
            Some(Err(err)) => Err(err),
        }
    }

    fn on_answer(
        &self,
        session: &mut AdaptiveSessionController,
        index: usize,
    ) -> Result<(), SessionError> {
        match session.answer(index) {
            Ok(AnswerOutcome::Recorded(recorded)) => self.emit(SessionEvent::Answered(recorded)),
            Ok(AnswerOutcome::Ignored) => {}
            Err(SessionError::InvalidOption { index, len }) => {
                self.emit(SessionEvent::Rejected { index, len });
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn on_tick(&self, session: &mut AdaptiveSessionController) {
        match session.tick() {
            TickOutcome::Remaining(remaining) => self.emit(SessionEvent::Tick { remaining }),
            TickOutcome::Expired(recorded) => self.emit(SessionEvent::Answered(recorded)),
            TickOutcome::Ignored => {}
        }
    }

    /// Answers sent during the adapting pause are dropped.
    fn discard_queued(&mut self, session: &mut AdaptiveSessionController) {
        while let Ok(index) = self.answers.try_recv() {
            if let Ok(AnswerOutcome::Ignored) = session.answer(index) {
                debug!(session_id = %session.id(), index, "discarded answer sent while adapting");
            }
        }
    }

    fn present(&self, session: &AdaptiveSessionController, ticker: &mut Interval) {
        if let Some(view) = session.view() {
            ticker.reset();
            self.emit(SessionEvent::Question(view));
        }
    }

    fn cancel(&self, session: &mut AdaptiveSessionController) -> RunOutcome {
        session.abort(AbortReason::Cancelled);
        info!(session_id = %session.id(), "session cancelled");
        self.emit(SessionEvent::Aborted {
            reason: AbortReason::Cancelled,
        });
        RunOutcome::Cancelled
    }

    fn emit(&self, event: SessionEvent) {
        // The presentation side may have gone away; the session still runs to an end state.
        let _ = self.events.send(event);
    }
}
