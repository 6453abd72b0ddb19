//! JSON shapes exchanged with the assessment API and their domain mapping.

use std::collections::BTreeMap;

use quiz_core::model::{AnsweredItem, DifficultyTier, Question, QuestionId};
use quiz_core::pool::QuestionPool;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backend::{BackendError, PoolResponse};

const DEFAULT_STARTING_LEVEL: DifficultyTier = DifficultyTier::Medium;

/// A question as served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub id: u64,
    #[serde(default)]
    pub topic: String,
    pub difficulty: DifficultyTier,
    #[serde(alias = "prompt")]
    pub question: String,
    pub options: Vec<String>,
    #[serde(alias = "correct_index")]
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionPayload {
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPayload` if the question fails validation.
    pub fn into_question(self) -> Result<Question, BackendError> {
        Question::new(
            QuestionId::new(self.id),
            self.topic,
            self.difficulty,
            self.question,
            self.options,
            self.correct_answer,
            self.explanation,
        )
        .map_err(|e| BackendError::InvalidPayload(e.into()))
    }

    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().value(),
            topic: question.topic().to_owned(),
            difficulty: question.difficulty(),
            question: question.prompt().to_owned(),
            options: question.options().to_vec(),
            correct_answer: question.correct_index(),
            explanation: question.explanation().map(str::to_owned),
        }
    }
}

/// Response of the adaptive-questions endpoint.
///
/// Newer servers send questions pre-partitioned by tier; older ones send a
/// flat list and no starting level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PoolPayload {
    Tiered {
        pool: BTreeMap<DifficultyTier, Vec<QuestionPayload>>,
        #[serde(default, alias = "startingLevel")]
        starting_level: Option<DifficultyTier>,
    },
    Flat {
        questions: Vec<QuestionPayload>,
        #[serde(default, alias = "startingLevel")]
        starting_level: Option<DifficultyTier>,
    },
}

/// Keep the questions that validate; a bad one is logged and left out so the
/// rest of the pool is still usable.
fn valid_questions(payloads: Vec<QuestionPayload>) -> Vec<Question> {
    payloads
        .into_iter()
        .filter_map(|payload| {
            let id = payload.id;
            match payload.into_question() {
                Ok(question) => Some(question),
                Err(e) => {
                    warn!(question_id = id, error = %e, "skipping invalid question");
                    None
                }
            }
        })
        .collect()
}

impl PoolPayload {
    /// Invalid questions are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPayload` if a question is filed under the
    /// wrong tier or an id is repeated.
    pub fn into_response(self) -> Result<PoolResponse, BackendError> {
        let (pool, starting_level) = match self {
            PoolPayload::Tiered {
                pool,
                starting_level,
            } => {
                let tiers = pool
                    .into_iter()
                    .map(|(tier, questions)| (tier, valid_questions(questions)));
                let pool = QuestionPool::new(tiers).map_err(|e| BackendError::InvalidPayload(e.into()))?;
                (pool, starting_level)
            }
            PoolPayload::Flat {
                questions,
                starting_level,
            } => {
                let pool = QuestionPool::from_questions(valid_questions(questions))
                    .map_err(|e| BackendError::InvalidPayload(e.into()))?;
                (pool, starting_level)
            }
        };

        Ok(PoolResponse {
            pool,
            starting_level: starting_level.unwrap_or(DEFAULT_STARTING_LEVEL),
        })
    }
}

/// Parse a pool document (either shape) from JSON text.
///
/// # Errors
///
/// Returns `BackendError::Decode` for malformed JSON and
/// `BackendError::InvalidPayload` for a misfiled or repeated question.
pub fn parse_pool(json: &str) -> Result<PoolResponse, BackendError> {
    let payload: PoolPayload = serde_json::from_str(json)?;
    payload.into_response()
}

/// One submitted answer. `selected_answer` is `null` for a timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub question_id: QuestionId,
    pub selected_answer: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub answers: Vec<AnswerPayload>,
}

impl SubmitPayload {
    #[must_use]
    pub fn from_answers(answers: &[AnsweredItem]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|item| AnswerPayload {
                    question_id: item.question_id(),
                    selected_answer: item.selected().index(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::SelectedOption;

    const TIERED: &str = r#"{
        "pool": {
            "easy": [{"id": 1, "topic": "Python Basics", "difficulty": "easy",
                      "question": "print type?", "options": ["fn", "kw"], "correct_answer": 0}],
            "hard": [{"id": 2, "topic": "Algorithms", "difficulty": "hard",
                      "question": "Dijkstra needs?", "options": ["neg edges", "non-neg edges"],
                      "correct_answer": 1, "explanation": "Greedy relaxation."}]
        },
        "starting_level": "easy"
    }"#;

    const FLAT: &str = r#"{
        "questions": [
            {"id": 1, "topic": "Web Development", "difficulty": "medium",
             "question": "HTTP verb for create?", "options": ["GET", "POST"], "correct_answer": 1},
            {"id": 2, "topic": "Web Development", "difficulty": "hard",
             "question": "Idempotent verb?", "options": ["POST", "PUT"], "correct_answer": 1}
        ]
    }"#;

    #[test]
    fn parses_tiered_pool() {
        let response = parse_pool(TIERED).unwrap();
        assert_eq!(response.starting_level, DifficultyTier::Easy);
        assert_eq!(response.pool.total(), 2);
        assert_eq!(response.pool.tier(DifficultyTier::Hard).len(), 1);
        assert!(response.pool.tier(DifficultyTier::Medium).is_empty());
    }

    #[test]
    fn parses_flat_pool_with_default_level() {
        let response = parse_pool(FLAT).unwrap();
        assert_eq!(response.starting_level, DifficultyTier::Medium);
        assert_eq!(response.pool.tier(DifficultyTier::Medium).len(), 1);
        assert_eq!(response.pool.tier(DifficultyTier::Hard).len(), 1);
    }

    #[test]
    fn misfiled_question_is_invalid() {
        let json = r#"{"pool": {"easy": [{"id": 1, "difficulty": "hard",
            "question": "q", "options": ["a", "b"], "correct_answer": 0}]}}"#;
        let err = parse_pool(json).unwrap_err();
        assert!(matches!(err, BackendError::InvalidPayload(_)));
    }

    #[test]
    fn single_option_question_is_kept() {
        let json = r#"{"questions": [
            {"id": 1, "difficulty": "easy", "question": "q", "options": ["a", "b"], "correct_answer": 0},
            {"id": 2, "difficulty": "easy", "question": "Agree?", "options": ["yes"], "correct_answer": 0}
        ]}"#;
        let response = parse_pool(json).unwrap();
        assert_eq!(response.pool.total(), 2);
        assert_eq!(response.pool.get(QuestionId::new(2)).unwrap().options(), ["yes"]);
    }

    #[test]
    fn invalid_question_is_skipped() {
        let json = r#"{"pool": {"medium": [
            {"id": 1, "difficulty": "medium", "question": "q", "options": ["a", "b"], "correct_answer": 0},
            {"id": 2, "difficulty": "medium", "question": "q", "options": [], "correct_answer": 0},
            {"id": 3, "difficulty": "medium", "question": "q", "options": ["a"], "correct_answer": 4}
        ]}}"#;
        let response = parse_pool(json).unwrap();
        assert_eq!(response.pool.total(), 1);
        assert_eq!(response.pool.tier(DifficultyTier::Medium)[0].id(), QuestionId::new(1));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(parse_pool("{}"), Err(BackendError::Decode(_))));
    }

    #[test]
    fn submit_payload_uses_null_for_timeout() {
        let question = Question::new(
            QuestionId::new(5),
            "Algorithms",
            DifficultyTier::Easy,
            "q",
            vec!["a".into(), "b".into()],
            0,
            None,
        )
        .unwrap();
        let answers = vec![
            AnsweredItem::new(&question, SelectedOption::Chosen(1), 4),
            AnsweredItem::new(&question, SelectedOption::TimedOut, 60),
        ];
        let json = serde_json::to_value(SubmitPayload::from_answers(&answers)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"answers": [
                {"question_id": 5, "selected_answer": 1},
                {"question_id": 5, "selected_answer": null}
            ]})
        );
    }

    #[test]
    fn payload_round_trips_question() {
        let response = parse_pool(TIERED).unwrap();
        let question = &response.pool.tier(DifficultyTier::Hard)[0];
        let payload = QuestionPayload::from_question(question);
        assert_eq!(payload.into_question().unwrap(), *question);
    }
}
