mod controller;
mod progress;
mod runner;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{
    AbortReason, AdaptiveSessionController, Advance, AnswerOutcome, RecordedAnswer,
    SessionPhase, SessionState, TickOutcome,
};
pub use progress::SessionProgress;
pub use runner::{RunOutcome, SessionEvent, SessionHandle, SessionRunner};
pub use view::{QuestionView, insight_for};
pub use workflow::SessionLoopService;
