use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} marks option {index} correct but only has {len} options")]
    CorrectIndexOutOfRange {
        id: QuestionId,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown difficulty tier: {raw}")]
pub struct TierParseError {
    raw: String,
}

//
// ─── DIFFICULTY TIER ───────────────────────────────────────────────────────────
//

/// Difficulty class of a question. Totally ordered `Easy < Medium < Hard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// One tier up, or `None` at the ceiling.
    #[must_use]
    pub fn promoted(self) -> Option<Self> {
        match self {
            Self::Easy => Some(Self::Medium),
            Self::Medium => Some(Self::Hard),
            Self::Hard => None,
        }
    }

    /// One tier down, or `None` at the floor.
    #[must_use]
    pub fn demoted(self) -> Option<Self> {
        match self {
            Self::Easy => None,
            Self::Medium => Some(Self::Easy),
            Self::Hard => Some(Self::Medium),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Capitalized label for feedback text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(TierParseError { raw: s.to_owned() }),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question as received from the backend.
///
/// Immutable once built; the pool owns every question for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    topic: String,
    difficulty: DifficultyTier,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: Option<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if there are no options or `correct_index` does
    /// not point at one.
    pub fn new(
        id: QuestionId,
        topic: impl Into<String>,
        difficulty: DifficultyTier,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        if options.is_empty() {
            return Err(QuestionError::NoOptions { id });
        }
        if correct_index >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                id,
                index: correct_index,
                len: options.len(),
            });
        }

        Ok(Self {
            id,
            topic: topic.into(),
            difficulty,
            prompt: prompt.into(),
            options,
            correct_index,
            explanation: explanation.filter(|e| !e.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyTier {
        self.difficulty
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn has_option(&self, index: usize) -> bool {
        index < self.options.len()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("opt {i}")).collect()
    }

    #[test]
    fn tier_steps_are_capped() {
        assert_eq!(DifficultyTier::Easy.promoted(), Some(DifficultyTier::Medium));
        assert_eq!(DifficultyTier::Medium.promoted(), Some(DifficultyTier::Hard));
        assert_eq!(DifficultyTier::Hard.promoted(), None);
        assert_eq!(DifficultyTier::Hard.demoted(), Some(DifficultyTier::Medium));
        assert_eq!(DifficultyTier::Easy.demoted(), None);
        assert!(DifficultyTier::Easy < DifficultyTier::Hard);
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("Hard".parse::<DifficultyTier>().unwrap(), DifficultyTier::Hard);
        assert_eq!(" medium ".parse::<DifficultyTier>().unwrap(), DifficultyTier::Medium);
        assert!("expert".parse::<DifficultyTier>().is_err());
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_string(&DifficultyTier::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn question_requires_an_option() {
        let err = Question::new(
            QuestionId::new(1),
            "Algorithms",
            DifficultyTier::Easy,
            "What is O(1)?",
            options(0),
            0,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::NoOptions { .. }));
    }

    #[test]
    fn single_option_question_is_valid() {
        let q = Question::new(
            QuestionId::new(1),
            "Algorithms",
            DifficultyTier::Easy,
            "",
            options(1),
            0,
            None,
        )
        .unwrap();
        assert_eq!(q.options().len(), 1);
        assert!(q.has_option(0));
    }

    #[test]
    fn question_rejects_out_of_range_answer() {
        let err = Question::new(
            QuestionId::new(1),
            "Algorithms",
            DifficultyTier::Easy,
            "What is O(1)?",
            options(3),
            3,
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectIndexOutOfRange { index: 3, len: 3, .. }
        ));
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let q = Question::new(
            QuestionId::new(9),
            "Python Basics",
            DifficultyTier::Medium,
            "len([1, 2])?",
            options(2),
            1,
            Some("   ".into()),
        )
        .unwrap();
        assert_eq!(q.explanation(), None);
        assert!(q.has_option(1));
        assert!(!q.has_option(2));
    }
}
