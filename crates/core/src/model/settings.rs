use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question limit must be > 0")]
    InvalidQuestionLimit,

    #[error("question time limit must be > 0 seconds")]
    InvalidQuestionSecs,

    #[error("tick interval must be > 0 ms")]
    InvalidTickMs,

    #[error("promote window ({promote}s) must be shorter than the demote threshold ({demote}s)")]
    InvalidTimingBounds { promote: u32, demote: u32 },

    #[error("streak threshold must be >= 1")]
    InvalidStreakThreshold,
}

//
// ─── POLICY SETTINGS ───────────────────────────────────────────────────────────
//

/// Thresholds used by the difficulty policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySettings {
    promote_within_secs: u32,
    demote_after_secs: u32,
    streak_threshold: u32,
}

impl Default for PolicySettings {
    /// Fast answers are at most 15s, slow ones at least 45s, runs of 2 count.
    fn default() -> Self {
        Self {
            promote_within_secs: 15,
            demote_after_secs: 45,
            streak_threshold: 2,
        }
    }
}

impl PolicySettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if the promote window is not below the demote
    /// threshold or the streak threshold is zero.
    pub fn new(
        promote_within_secs: u32,
        demote_after_secs: u32,
        streak_threshold: u32,
    ) -> Result<Self, SettingsError> {
        if promote_within_secs >= demote_after_secs {
            return Err(SettingsError::InvalidTimingBounds {
                promote: promote_within_secs,
                demote: demote_after_secs,
            });
        }
        if streak_threshold == 0 {
            return Err(SettingsError::InvalidStreakThreshold);
        }
        Ok(Self {
            promote_within_secs,
            demote_after_secs,
            streak_threshold,
        })
    }

    #[must_use]
    pub fn promote_within_secs(&self) -> u32 {
        self.promote_within_secs
    }

    #[must_use]
    pub fn demote_after_secs(&self) -> u32 {
        self.demote_after_secs
    }

    #[must_use]
    pub fn streak_threshold(&self) -> u32 {
        self.streak_threshold
    }
}

//
// ─── SESSION SETTINGS ──────────────────────────────────────────────────────────
//

/// Per-session limits and timings.
///
/// `question_secs` counts countdown units; one unit elapses per `tick_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    question_limit: u32,
    question_secs: u32,
    adapting_ms: u64,
    tick_ms: u64,
    policy: PolicySettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            question_limit: 10,
            question_secs: 60,
            adapting_ms: 1_500,
            tick_ms: 1_000,
            policy: PolicySettings::default(),
        }
    }
}

impl SessionSettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if the limit, time limit or tick interval is zero.
    pub fn new(
        question_limit: u32,
        question_secs: u32,
        adapting_ms: u64,
        tick_ms: u64,
        policy: PolicySettings,
    ) -> Result<Self, SettingsError> {
        if question_limit == 0 {
            return Err(SettingsError::InvalidQuestionLimit);
        }
        if question_secs == 0 {
            return Err(SettingsError::InvalidQuestionSecs);
        }
        if tick_ms == 0 {
            return Err(SettingsError::InvalidTickMs);
        }
        Ok(Self {
            question_limit,
            question_secs,
            adapting_ms,
            tick_ms,
            policy,
        })
    }

    #[must_use]
    pub fn question_limit(&self) -> u32 {
        self.question_limit
    }

    #[must_use]
    pub fn question_secs(&self) -> u32 {
        self.question_secs
    }

    #[must_use]
    pub fn adapting_ms(&self) -> u64 {
        self.adapting_ms
    }

    #[must_use]
    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    #[must_use]
    pub fn policy(&self) -> PolicySettings {
        self.policy
    }
}
