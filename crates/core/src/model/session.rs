use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{AnsweredItem, DifficultyTier};

/// Why a session stopped asking questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The configured number of questions was answered.
    LimitReached,
    /// No tier had an unasked question left; answers were submitted early.
    PoolExhausted,
}

/// Correct / asked counts for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub asked: u32,
    pub correct: u32,
}

impl Tally {
    fn record(&mut self, correct: bool) {
        self.asked = self.asked.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Rounded percentage of correct answers, 0 when nothing was asked.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        if self.asked == 0 {
            return 0;
        }
        (self.correct * 100 + self.asked / 2) / self.asked
    }
}

/// Locally computed summary of a finished session.
///
/// The backend result stays authoritative; this report only describes what the
/// client observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    overall: Tally,
    per_tier: BTreeMap<DifficultyTier, Tally>,
    per_topic: BTreeMap<String, Tally>,
    timeouts: u32,
    final_level: DifficultyTier,
    termination: Termination,
}

impl SessionReport {
    /// Build a report from answers; `topic_of` resolves each item's topic.
    pub fn from_answers<'a, F>(
        answers: &[AnsweredItem],
        topic_of: F,
        final_level: DifficultyTier,
        termination: Termination,
    ) -> Self
    where
        F: Fn(&AnsweredItem) -> Option<&'a str>,
    {
        let mut overall = Tally::default();
        let mut per_tier: BTreeMap<DifficultyTier, Tally> = BTreeMap::new();
        let mut per_topic: BTreeMap<String, Tally> = BTreeMap::new();
        let mut timeouts = 0_u32;

        for item in answers {
            overall.record(item.is_correct());
            per_tier.entry(item.tier()).or_default().record(item.is_correct());
            if let Some(topic) = topic_of(item) {
                per_topic
                    .entry(topic.to_owned())
                    .or_default()
                    .record(item.is_correct());
            }
            if item.selected().is_timeout() {
                timeouts = timeouts.saturating_add(1);
            }
        }

        Self {
            overall,
            per_tier,
            per_topic,
            timeouts,
            final_level,
            termination,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.overall.asked
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.overall.correct
    }

    #[must_use]
    pub fn score_percent(&self) -> u32 {
        self.overall.accuracy_percent()
    }

    #[must_use]
    pub fn tier(&self, tier: DifficultyTier) -> Tally {
        self.per_tier.get(&tier).copied().unwrap_or_default()
    }

    pub fn topics(&self) -> impl Iterator<Item = (&str, Tally)> {
        self.per_topic.iter().map(|(topic, tally)| (topic.as_str(), *tally))
    }

    #[must_use]
    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    #[must_use]
    pub fn final_level(&self) -> DifficultyTier {
        self.final_level
    }

    #[must_use]
    pub fn termination(&self) -> Termination {
        self.termination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuestionId, SelectedOption};

    fn question(id: u64, tier: DifficultyTier, topic: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            topic,
            tier,
            format!("Q{id}"),
            vec!["a".into(), "b".into()],
            0,
            None,
        )
        .unwrap()
    }

    #[test]
    fn report_counts_tiers_topics_and_timeouts() {
        let q1 = question(1, DifficultyTier::Medium, "Algorithms");
        let q2 = question(2, DifficultyTier::Hard, "Algorithms");
        let q3 = question(3, DifficultyTier::Medium, "Python Basics");
        let questions = [q1.clone(), q2.clone(), q3.clone()];
        let answers = vec![
            AnsweredItem::new(&q1, SelectedOption::Chosen(0), 5),
            AnsweredItem::new(&q2, SelectedOption::TimedOut, 60),
            AnsweredItem::new(&q3, SelectedOption::Chosen(0), 20),
        ];

        let report = SessionReport::from_answers(
            &answers,
            |item| {
                questions
                    .iter()
                    .find(|q| q.id() == item.question_id())
                    .map(Question::topic)
            },
            DifficultyTier::Medium,
            Termination::PoolExhausted,
        );

        assert_eq!(report.total(), 3);
        assert_eq!(report.correct(), 2);
        assert_eq!(report.score_percent(), 67);
        assert_eq!(report.timeouts(), 1);
        assert_eq!(report.tier(DifficultyTier::Medium).correct, 2);
        assert_eq!(report.tier(DifficultyTier::Easy), Tally::default());
        let topics: Vec<_> = report.topics().collect();
        assert_eq!(topics[0].0, "Algorithms");
        assert_eq!(topics[0].1.accuracy_percent(), 50);
        assert_eq!(report.termination(), Termination::PoolExhausted);
    }
}
