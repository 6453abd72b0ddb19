/// Whether the countdown is currently consuming ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Running,
    /// Paused between questions; ticks are ignored.
    Suspended,
    /// Reached zero; ticks are ignored until the next reset.
    Expired,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running { remaining: u32 },
    /// Fired exactly once per question.
    Expired,
    Ignored,
}

/// Per-question countdown.
///
/// ```
/// # use quiz_core::countdown::{SessionClock, Tick};
/// let mut clock = SessionClock::new(2);
/// assert_eq!(clock.tick(), Tick::Running { remaining: 1 });
/// assert_eq!(clock.tick(), Tick::Expired);
/// assert_eq!(clock.tick(), Tick::Ignored);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    duration: u32,
    remaining: u32,
    state: CountdownState,
}

impl SessionClock {
    /// A running countdown of `duration` units.
    #[must_use]
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            state: CountdownState::Running,
        }
    }

    /// A countdown that ignores ticks until the first [`reset`](Self::reset).
    #[must_use]
    pub fn idle(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            state: CountdownState::Suspended,
        }
    }

    pub fn tick(&mut self) -> Tick {
        if self.state != CountdownState::Running {
            return Tick::Ignored;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = CountdownState::Expired;
            Tick::Expired
        } else {
            Tick::Running {
                remaining: self.remaining,
            }
        }
    }

    /// Restart at full duration for a new question.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.state = CountdownState::Running;
    }

    pub fn suspend(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Suspended;
        }
    }

    pub fn resume(&mut self) {
        if self.state == CountdownState::Suspended && self.remaining > 0 {
            self.state = CountdownState::Running;
        }
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Units consumed on the current question.
    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }
}
