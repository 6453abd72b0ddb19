use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::model::{DifficultyTier, Question, QuestionId};
use crate::policy::fallback_order;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolError {
    #[error("question {id} is {actual} but was filed under {filed}")]
    TierMismatch {
        id: QuestionId,
        filed: DifficultyTier,
        actual: DifficultyTier,
    },

    #[error("question {0} appears more than once in the pool")]
    DuplicateId(QuestionId),
}

/// Questions available for one session, partitioned by tier.
///
/// Read-only after construction; which questions were already asked is the
/// caller's business and is passed in as an exclusion set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionPool {
    tiers: BTreeMap<DifficultyTier, Vec<Question>>,
}

impl QuestionPool {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a pool from tiered lists as delivered by the backend.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::TierMismatch` if a question's difficulty differs from
    /// the tier it is filed under, or `PoolError::DuplicateId` if an id repeats.
    pub fn new(
        tiers: impl IntoIterator<Item = (DifficultyTier, Vec<Question>)>,
    ) -> Result<Self, PoolError> {
        let mut seen = HashSet::new();
        let mut pool = Self::default();
        for (tier, questions) in tiers {
            for question in &questions {
                if question.difficulty() != tier {
                    return Err(PoolError::TierMismatch {
                        id: question.id(),
                        filed: tier,
                        actual: question.difficulty(),
                    });
                }
                if !seen.insert(question.id()) {
                    return Err(PoolError::DuplicateId(question.id()));
                }
            }
            pool.tiers.entry(tier).or_default().extend(questions);
        }
        Ok(pool)
    }

    /// Build a pool from a flat list, filing each question under its own tier.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::DuplicateId` if an id repeats.
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Result<Self, PoolError> {
        let mut seen = HashSet::new();
        let mut pool = Self::default();
        for question in questions {
            if !seen.insert(question.id()) {
                return Err(PoolError::DuplicateId(question.id()));
            }
            pool.tiers
                .entry(question.difficulty())
                .or_default()
                .push(question);
        }
        Ok(pool)
    }

    #[must_use]
    pub fn tier(&self, tier: DifficultyTier) -> &[Question] {
        self.tiers.get(&tier).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.tiers.values().flatten().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of questions in `tier` not in `exclude`.
    #[must_use]
    pub fn remaining(&self, tier: DifficultyTier, exclude: &HashSet<QuestionId>) -> usize {
        self.tier(tier)
            .iter()
            .filter(|q| !exclude.contains(&q.id()))
            .count()
    }

    /// Uniformly random question from `tier` whose id is not excluded.
    pub fn select<R: Rng + ?Sized>(
        &self,
        tier: DifficultyTier,
        exclude: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> Option<&Question> {
        let candidates: Vec<&Question> = self
            .tier(tier)
            .iter()
            .filter(|q| !exclude.contains(&q.id()))
            .collect();
        candidates.choose(rng).copied()
    }

    /// Like [`select`](Self::select), walking the fallback order when `preferred`
    /// is used up. `None` means every tier is exhausted.
    pub fn select_with_fallback<R: Rng + ?Sized>(
        &self,
        preferred: DifficultyTier,
        exclude: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> Option<&Question> {
        fallback_order(preferred).find_map(|tier| self.select(tier, exclude, rng))
    }
}
