use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::{DifficultyTier, Question};

//
// ─── SELECTED OPTION ───────────────────────────────────────────────────────────
//

/// What the test-taker picked for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectedOption {
    /// Index into the question's options.
    Chosen(usize),
    /// The countdown ran out before an answer was given.
    TimedOut,
}

impl SelectedOption {
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Chosen(index) => Some(index),
            Self::TimedOut => None,
        }
    }

    #[must_use]
    pub fn is_timeout(self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

//
// ─── ANSWERED ITEM ─────────────────────────────────────────────────────────────
//

/// One attempted question. Appended once per question and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredItem {
    question_id: QuestionId,
    selected: SelectedOption,
    is_correct: bool,
    tier: DifficultyTier,
    seconds_taken: u32,
}

impl AnsweredItem {
    /// Record an attempt against `question`.
    ///
    /// Correctness is derived from the question; a timeout is never correct.
    #[must_use]
    pub fn new(question: &Question, selected: SelectedOption, seconds_taken: u32) -> Self {
        let is_correct = match selected {
            SelectedOption::Chosen(index) => index == question.correct_index(),
            SelectedOption::TimedOut => false,
        };

        Self {
            question_id: question.id(),
            selected,
            is_correct,
            tier: question.difficulty(),
            seconds_taken,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn selected(&self) -> SelectedOption {
        self.selected
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    /// Tier of the question that was asked.
    #[must_use]
    pub fn tier(&self) -> DifficultyTier {
        self.tier
    }

    #[must_use]
    pub fn seconds_taken(&self) -> u32 {
        self.seconds_taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question::new(
            QuestionId::new(3),
            "Data Structures",
            DifficultyTier::Hard,
            "Which structure is FIFO?",
            vec!["Stack".into(), "Queue".into(), "Tree".into()],
            1,
            Some("Queues serve in arrival order.".into()),
        )
        .unwrap()
    }

    #[test]
    fn correct_choice_is_marked_correct() {
        let item = AnsweredItem::new(&question(), SelectedOption::Chosen(1), 12);
        assert!(item.is_correct());
        assert_eq!(item.tier(), DifficultyTier::Hard);
        assert_eq!(item.seconds_taken(), 12);
    }

    #[test]
    fn wrong_choice_is_marked_incorrect() {
        let item = AnsweredItem::new(&question(), SelectedOption::Chosen(0), 3);
        assert!(!item.is_correct());
    }

    #[test]
    fn timeout_is_never_correct() {
        let item = AnsweredItem::new(&question(), SelectedOption::TimedOut, 60);
        assert!(!item.is_correct());
        assert!(item.selected().is_timeout());
        assert_eq!(item.selected().index(), None);
    }
}
