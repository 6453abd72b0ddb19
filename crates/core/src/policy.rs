use crate::model::{DifficultyTier, PolicySettings};

//
// ─── FALLBACK ORDER ────────────────────────────────────────────────────────────
//

/// Tiers tried, in order, when the chosen tier has nothing unasked left.
pub const FALLBACK_ORDER: [DifficultyTier; 3] = [
    DifficultyTier::Medium,
    DifficultyTier::Easy,
    DifficultyTier::Hard,
];

/// The preferred tier first, then `FALLBACK_ORDER` without it.
///
/// ```
/// # use quiz_core::model::DifficultyTier;
/// # use quiz_core::policy::fallback_order;
/// let order: Vec<_> = fallback_order(DifficultyTier::Easy).collect();
/// assert_eq!(
///     order,
///     [DifficultyTier::Easy, DifficultyTier::Medium, DifficultyTier::Hard]
/// );
/// ```
pub fn fallback_order(preferred: DifficultyTier) -> impl Iterator<Item = DifficultyTier> {
    std::iter::once(preferred).chain(
        FALLBACK_ORDER
            .into_iter()
            .filter(move |tier| *tier != preferred),
    )
}

//
// ─── INPUT / OUTPUT ────────────────────────────────────────────────────────────
//

/// What the policy needs to know about the answer just given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerSignal {
    pub is_correct: bool,
    pub seconds_taken: u32,
    pub timed_out: bool,
}

impl AnswerSignal {
    #[must_use]
    pub fn answered(is_correct: bool, seconds_taken: u32) -> Self {
        Self {
            is_correct,
            seconds_taken,
            timed_out: false,
        }
    }

    #[must_use]
    pub fn timed_out(seconds_taken: u32) -> Self {
        Self {
            is_correct: false,
            seconds_taken,
            timed_out: true,
        }
    }
}

/// Which rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChange {
    Promoted,
    /// Promotion earned at the ceiling; level and streak are kept.
    Mastery,
    Demoted,
    /// Demotion earned at the floor; level and streak are kept.
    Floor,
    Unchanged,
}

/// Result of applying the policy to one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub level: DifficultyTier,
    pub streak: i32,
    pub change: LevelChange,
    /// Feedback line for the test-taker. Wording is not part of the contract.
    pub rationale: String,
}

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// Rule table that moves the difficulty level after each answer.
///
/// Rules, first match wins:
/// 1. The streak grows in the direction of the answer and flips to ±1 on a
///    change of sign.
/// 2. A correct answer that was fast or extends a run promotes one tier.
/// 3. A wrong answer that was slow, timed out, or extends a run of misses
///    demotes one tier.
/// 4. Anything else keeps the level.
///
/// The streak is reset to 0 only when the tier actually changes.
///
/// ```
/// # use quiz_core::model::DifficultyTier;
/// # use quiz_core::policy::{AnswerSignal, DifficultyPolicy};
/// let policy = DifficultyPolicy::default();
/// let t = policy.next_level(DifficultyTier::Medium, 0, AnswerSignal::answered(true, 10));
/// assert_eq!(t.level, DifficultyTier::Hard);
/// assert_eq!(t.streak, 0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DifficultyPolicy {
    settings: PolicySettings,
}

impl DifficultyPolicy {
    #[must_use]
    pub fn new(settings: PolicySettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> PolicySettings {
        self.settings
    }

    #[must_use]
    pub fn next_level(
        &self,
        current: DifficultyTier,
        streak: i32,
        signal: AnswerSignal,
    ) -> Transition {
        let next_streak = if signal.is_correct {
            if streak > 0 { streak.saturating_add(1) } else { 1 }
        } else if streak < 0 {
            streak.saturating_sub(1)
        } else {
            -1
        };
        let threshold = i32::try_from(self.settings.streak_threshold()).unwrap_or(i32::MAX);

        let fast = signal.seconds_taken <= self.settings.promote_within_secs();
        if signal.is_correct && (fast || next_streak >= threshold) {
            return match current.promoted() {
                Some(level) => {
                    let rationale = if fast {
                        format!("Quick and correct! Moving up to {}.", level.label())
                    } else {
                        format!("{next_streak} in a row! Moving up to {}.", level.label())
                    };
                    Transition {
                        level,
                        streak: 0,
                        change: LevelChange::Promoted,
                        rationale,
                    }
                }
                None => Transition {
                    level: current,
                    streak: next_streak,
                    change: LevelChange::Mastery,
                    rationale: format!("Mastery! Holding at {}.", current.label()),
                },
            };
        }

        let slow = signal.seconds_taken >= self.settings.demote_after_secs();
        if !signal.is_correct && (signal.timed_out || slow || next_streak <= -threshold) {
            return match current.demoted() {
                Some(level) => {
                    let rationale = if signal.timed_out {
                        format!("Time ran out. Stepping down to {} to rebuild.", level.label())
                    } else if slow {
                        format!("That took a while. Stepping down to {}.", level.label())
                    } else {
                        format!(
                            "{} misses in a row. Stepping down to {}.",
                            next_streak.unsigned_abs(),
                            level.label()
                        )
                    };
                    Transition {
                        level,
                        streak: 0,
                        change: LevelChange::Demoted,
                        rationale,
                    }
                }
                None => Transition {
                    level: current,
                    streak: next_streak,
                    change: LevelChange::Floor,
                    rationale: format!(
                        "Staying on {} to reinforce fundamentals.",
                        current.label()
                    ),
                },
            };
        }

        let rationale = if signal.is_correct {
            format!("Correct. Holding at {}.", current.label())
        } else {
            format!("Not quite. Holding at {}.", current.label())
        };
        Transition {
            level: current,
            streak: next_streak,
            change: LevelChange::Unchanged,
            rationale,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
