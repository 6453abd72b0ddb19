use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::model::{AnsweredItem, DifficultyTier, Question, QuestionId};
use quiz_core::pool::QuestionPool;

use crate::backend::{AssessmentBackend, BackendError, PoolResponse};
use crate::result::{QuestionResult, ResultSummary, TopicPerformance};
use crate::wire;

#[derive(Debug, Default)]
struct FailurePlan {
    fetch: u32,
    submit: u32,
}

/// In-process backend for tests and offline runs.
///
/// Serves a fixed question set, grades submissions locally and remembers them.
#[derive(Clone)]
pub struct InMemoryBackend {
    questions: Arc<Vec<Question>>,
    starting_level: DifficultyTier,
    submissions: Arc<Mutex<Vec<Vec<AnsweredItem>>>>,
    failures: Arc<Mutex<FailurePlan>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(Vec::new(), DifficultyTier::Medium)
    }
}

impl InMemoryBackend {
    #[must_use]
    pub fn new(questions: Vec<Question>, starting_level: DifficultyTier) -> Self {
        Self {
            questions: Arc::new(questions),
            starting_level,
            submissions: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(FailurePlan::default())),
        }
    }

    /// Load a pool document (tiered or flat) from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the document is malformed or invalid.
    pub fn from_json(json: &str) -> Result<Self, BackendError> {
        let PoolResponse {
            pool,
            starting_level,
        } = wire::parse_pool(json)?;
        let questions = DifficultyTier::ALL
            .into_iter()
            .flat_map(|tier| pool.tier(tier).to_vec())
            .collect();
        Ok(Self::new(questions, starting_level))
    }

    /// Make the next `count` fetches fail.
    pub fn fail_next_fetches(&self, count: u32) {
        if let Ok(mut plan) = self.failures.lock() {
            plan.fetch = count;
        }
    }

    /// Make the next `count` submissions fail.
    pub fn fail_next_submits(&self, count: u32) {
        if let Ok(mut plan) = self.failures.lock() {
            plan.submit = count;
        }
    }

    /// Every accepted submission, oldest first.
    #[must_use]
    pub fn submissions(&self) -> Vec<Vec<AnsweredItem>> {
        self.submissions
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn take_failure(
        &self,
        pick: impl FnOnce(&mut FailurePlan) -> &mut u32,
    ) -> Result<bool, BackendError> {
        let mut plan = self
            .failures
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        let remaining = pick(&mut *plan);
        if *remaining > 0 {
            *remaining -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn grade(&self, answers: &[AnsweredItem]) -> ResultSummary {
        let by_id: HashMap<QuestionId, &Question> =
            self.questions.iter().map(|q| (q.id(), q)).collect();

        let mut topics: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
        let mut question_results = Vec::with_capacity(answers.len());
        let mut correct = 0_u32;

        for item in answers {
            let Some(question) = by_id.get(&item.question_id()) else {
                continue;
            };
            let entry = topics.entry(question.topic()).or_default();
            entry.0 += 1;
            if item.is_correct() {
                entry.1 += 1;
                correct += 1;
            }
            question_results.push(QuestionResult {
                question_id: Some(question.id()),
                question: question.prompt().to_owned(),
                topic: question.topic().to_owned(),
                difficulty: Some(question.difficulty()),
                options: question.options().to_vec(),
                selected_answer: item
                    .selected()
                    .index()
                    .and_then(|i| i64::try_from(i).ok()),
                correct_answer: Some(question.correct_index()),
                is_correct: item.is_correct(),
                explanation: question.explanation().map(str::to_owned),
            });
        }

        let total = u32::try_from(question_results.len()).unwrap_or(u32::MAX);
        let percent = |hit: u32, of: u32| {
            if of == 0 {
                0.0
            } else {
                (f64::from(hit) * 1000.0 / f64::from(of)).round() / 10.0
            }
        };
        let topic_performance: Vec<TopicPerformance> = topics
            .iter()
            .map(|(topic, (asked, hit))| TopicPerformance {
                topic: (*topic).to_owned(),
                accuracy: percent(*hit, *asked),
            })
            .collect();
        let recommendation = topic_performance
            .iter()
            .min_by(|a, b| a.accuracy.total_cmp(&b.accuracy))
            .map(|weakest| format!("Spend your next session on {}.", weakest.topic));

        ResultSummary {
            score: percent(correct, total),
            correct,
            total,
            topic_performance,
            recommendation,
            question_results,
        }
    }
}

#[async_trait]
impl AssessmentBackend for InMemoryBackend {
    async fn fetch_pool(&self, topics: &[String]) -> Result<PoolResponse, BackendError> {
        if self.take_failure(|plan| &mut plan.fetch)? {
            return Err(BackendError::Unavailable("question pool unavailable".into()));
        }

        let wanted = |question: &Question| {
            topics.is_empty()
                || topics
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(question.topic()))
        };
        let selected = self.questions.iter().filter(|&q| wanted(q)).cloned();
        let pool = QuestionPool::from_questions(selected)
            .map_err(|e| BackendError::InvalidPayload(e.into()))?;

        Ok(PoolResponse {
            pool,
            starting_level: self.starting_level,
        })
    }

    async fn submit(&self, answers: &[AnsweredItem]) -> Result<ResultSummary, BackendError> {
        if self.take_failure(|plan| &mut plan.submit)? {
            return Err(BackendError::Unavailable("submission rejected".into()));
        }

        let summary = self.grade(answers);
        let mut guard = self
            .submissions
            .lock()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        guard.push(answers.to_vec());
        Ok(summary)
    }
}
