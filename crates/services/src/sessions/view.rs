use quiz_core::model::{DifficultyTier, Question, QuestionId};

/// Snapshot of the question currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 1-based position in the session.
    pub number: usize,
    pub limit: usize,
    pub question_id: QuestionId,
    pub topic: String,
    pub tier: DifficultyTier,
    pub prompt: String,
    pub options: Vec<String>,
    pub remaining_secs: u32,
    pub insight: String,
}

impl QuestionView {
    pub(crate) fn new(question: &Question, index: usize, limit: usize, remaining_secs: u32) -> Self {
        Self {
            number: index + 1,
            limit,
            question_id: question.id(),
            topic: question.topic().to_owned(),
            tier: question.difficulty(),
            prompt: question.prompt().to_owned(),
            options: question.options().to_vec(),
            remaining_secs,
            insight: insight_for(question, index),
        }
    }
}

/// One-line hint explaining why this question was picked.
#[must_use]
pub fn insight_for(question: &Question, index: usize) -> String {
    let topic = question.topic();
    if index == 0 {
        return format!("Baseline check: Calibrating your {topic} skills.");
    }
    match question.difficulty() {
        DifficultyTier::Hard => format!("Level up! Testing your limits in {topic}."),
        DifficultyTier::Easy => format!("Reinforcing fundamentals in {topic}."),
        DifficultyTier::Medium => format!("Targeting balanced proficiency in {topic}."),
    }
}
