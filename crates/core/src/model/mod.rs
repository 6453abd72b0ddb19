mod answer;
mod ids;
mod question;
mod session;
mod settings;

pub use ids::{ParseIdError, QuestionId, SessionId};

pub use answer::{AnsweredItem, SelectedOption};
pub use question::{DifficultyTier, Question, QuestionError, TierParseError};
pub use session::{SessionReport, Tally, Termination};
pub use settings::{PolicySettings, SessionSettings, SettingsError};
