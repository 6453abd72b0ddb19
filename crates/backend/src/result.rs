use quiz_core::model::{DifficultyTier, QuestionId};
use serde::{Deserialize, Serialize};

/// Accuracy for one topic as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicPerformance {
    pub topic: String,
    #[serde(default)]
    pub accuracy: f64,
}

/// Per-question review line as reported by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionResult {
    #[serde(alias = "id")]
    pub question_id: Option<QuestionId>,
    pub question: String,
    pub topic: String,
    pub difficulty: Option<DifficultyTier>,
    pub options: Vec<String>,
    pub selected_answer: Option<i64>,
    pub correct_answer: Option<usize>,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl QuestionResult {
    /// Text of the chosen option, if any was chosen.
    #[must_use]
    pub fn selected_text(&self) -> Option<&str> {
        let index = usize::try_from(self.selected_answer?).ok()?;
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_text(&self) -> Option<&str> {
        self.options.get(self.correct_answer?).map(String::as_str)
    }
}

/// Outcome returned by the backend after submission.
///
/// Passed through to the presentation layer; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultSummary {
    pub score: f64,
    pub correct: u32,
    pub total: u32,
    pub topic_performance: Vec<TopicPerformance>,
    pub recommendation: Option<String>,
    pub question_results: Vec<QuestionResult>,
}
