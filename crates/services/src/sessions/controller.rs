use std::collections::HashSet;
use std::fmt;

use backend::ResultSummary;
use chrono::{DateTime, Utc};
use quiz_core::countdown::{SessionClock, Tick};
use quiz_core::model::{
    AnsweredItem, DifficultyTier, Question, QuestionId, SelectedOption, SessionId,
    SessionReport, SessionSettings, Termination,
};
use quiz_core::policy::{AnswerSignal, DifficultyPolicy, Transition};
use quiz_core::pool::QuestionPool;
use rand::Rng;
use tracing::{debug, info};

use super::progress::SessionProgress;
use super::view::QuestionView;
use crate::error::SessionError;

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    AwaitingAnswer,
    /// Pause between questions; input is ignored.
    Adapting,
    Submitting,
    Done,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The question pool could not be loaded.
    FetchFailed,
    /// The session was torn down before it finished.
    Cancelled,
}

/// An answer that was accepted, with the policy decision it caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAnswer {
    pub item: AnsweredItem,
    pub transition: Transition,
    pub answered: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded(RecordedAnswer),
    /// Not awaiting an answer; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Remaining(u32),
    /// The countdown hit zero and a timeout was recorded.
    Expired(RecordedAnswer),
    Ignored,
}

/// What happened after a question was picked (or could not be).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Question(QuestionId),
    Submit(Termination),
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// The single mutable record of a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    level: DifficultyTier,
    streak: i32,
    asked: HashSet<QuestionId>,
    current: Option<QuestionId>,
    clock: SessionClock,
}

impl SessionState {
    fn new(question_secs: u32) -> Self {
        Self {
            level: DifficultyTier::Medium,
            streak: 0,
            asked: HashSet::new(),
            current: None,
            clock: SessionClock::idle(question_secs),
        }
    }

    #[must_use]
    pub fn level(&self) -> DifficultyTier {
        self.level
    }

    /// Positive for a run of correct answers, negative for a run of misses.
    #[must_use]
    pub fn streak(&self) -> i32 {
        self.streak
    }

    #[must_use]
    pub fn asked(&self) -> &HashSet<QuestionId> {
        &self.asked
    }

    #[must_use]
    pub fn current_question_id(&self) -> Option<QuestionId> {
        self.current
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.clock.remaining()
    }

    #[must_use]
    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// State machine for one adaptive quiz attempt.
///
/// Every event (answer, tick, end of the adapting pause, submission result)
/// goes through `&mut self`, so there is exactly one writer and no shadow copy
/// of the state. Events that do not fit the current phase are ignored.
pub struct AdaptiveSessionController {
    id: SessionId,
    settings: SessionSettings,
    policy: DifficultyPolicy,
    topics: Vec<String>,
    pool: QuestionPool,
    phase: SessionPhase,
    state: SessionState,
    answers: Vec<AnsweredItem>,
    last_transition: Option<Transition>,
    termination: Option<Termination>,
    result: Option<ResultSummary>,
    submit_attempts: u32,
    abort_reason: Option<AbortReason>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl AdaptiveSessionController {
    /// Create a session in `Loading`, waiting for its pool.
    #[must_use]
    pub fn new(settings: SessionSettings, topics: Vec<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::random(),
            settings,
            policy: DifficultyPolicy::new(settings.policy()),
            topics,
            pool: QuestionPool::empty(),
            phase: SessionPhase::Loading,
            state: SessionState::new(settings.question_secs()),
            answers: Vec::new(),
            last_transition: None,
            termination: None,
            result: None,
            submit_attempts: 0,
            abort_reason: None,
            started_at,
            completed_at: None,
        }
    }

    /// Install the pool and pick the first question at `starting_level`.
    ///
    /// An empty pool moves straight to `Submitting` with no answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Loading`.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        pool: QuestionPool,
        starting_level: DifficultyTier,
        rng: &mut R,
    ) -> Result<Advance, SessionError> {
        self.expect_phase(SessionPhase::Loading)?;
        self.pool = pool;
        self.state.level = starting_level;
        info!(
            session_id = %self.id,
            pool_size = self.pool.total(),
            %starting_level,
            "session started"
        );
        Ok(self.pick_next(rng))
    }

    /// Record a manual answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidOption` if `index` is not one of the
    /// current question's options. Answers outside `AwaitingAnswer` are
    /// ignored rather than rejected.
    pub fn answer(&mut self, index: usize) -> Result<AnswerOutcome, SessionError> {
        if self.phase != SessionPhase::AwaitingAnswer {
            debug!(session_id = %self.id, phase = ?self.phase, "ignoring answer");
            return Ok(AnswerOutcome::Ignored);
        }
        let len = self.current_question().map_or(0, |q| q.options().len());
        if index >= len {
            return Err(SessionError::InvalidOption { index, len });
        }
        Ok(self
            .record(SelectedOption::Chosen(index))
            .map_or(AnswerOutcome::Ignored, AnswerOutcome::Recorded))
    }

    /// Advance the countdown by one unit; records a timeout when it runs out.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::AwaitingAnswer {
            return TickOutcome::Ignored;
        }
        match self.state.clock.tick() {
            Tick::Running { remaining } => TickOutcome::Remaining(remaining),
            Tick::Expired => self
                .record(SelectedOption::TimedOut)
                .map_or(TickOutcome::Ignored, TickOutcome::Expired),
            Tick::Ignored => TickOutcome::Ignored,
        }
    }

    /// End the adapting pause: submit at the limit, otherwise pick the next
    /// question (with fallback) or submit early when the pool is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Adapting`.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Advance, SessionError> {
        self.expect_phase(SessionPhase::Adapting)?;
        if self.answers.len() >= self.limit() {
            self.begin_submission(Termination::LimitReached);
            return Ok(Advance::Submit(Termination::LimitReached));
        }
        Ok(self.pick_next(rng))
    }

    /// Answers waiting to be submitted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Submitting`.
    pub fn pending_submission(&self) -> Result<&[AnsweredItem], SessionError> {
        self.expect_phase(SessionPhase::Submitting)?;
        Ok(&self.answers)
    }

    /// Store the backend result and finish.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Submitting`.
    pub fn complete(
        &mut self,
        result: ResultSummary,
        completed_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Submitting)?;
        self.submit_attempts = self.submit_attempts.saturating_add(1);
        self.result = Some(result);
        self.completed_at = Some(completed_at);
        self.phase = SessionPhase::Done;
        info!(
            session_id = %self.id,
            answered = self.answers.len(),
            attempts = self.submit_attempts,
            "session completed"
        );
        Ok(())
    }

    /// Note a failed submission. The session stays in `Submitting` with every
    /// answer intact so the submission can be retried.
    pub fn record_submit_failure(&mut self) {
        if self.phase == SessionPhase::Submitting {
            self.submit_attempts = self.submit_attempts.saturating_add(1);
        }
    }

    /// Tear the session down. No effect once `Done` or `Aborted`.
    pub fn abort(&mut self, reason: AbortReason) {
        if self.is_terminal() {
            return;
        }
        self.state.clock.suspend();
        self.state.current = None;
        self.abort_reason = Some(reason);
        self.phase = SessionPhase::Aborted;
        info!(session_id = %self.id, ?reason, answered = self.answers.len(), "session aborted");
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SessionPhase::Done | SessionPhase::Aborted)
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn pool(&self) -> &QuestionPool {
        &self.pool
    }

    #[must_use]
    pub fn answers(&self) -> &[AnsweredItem] {
        &self.answers
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.state.current.and_then(|id| self.pool.get(id))
    }

    /// Presentable snapshot of the current question, if one is on screen.
    #[must_use]
    pub fn view(&self) -> Option<QuestionView> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return None;
        }
        let question = self.current_question()?;
        Some(QuestionView::new(
            question,
            self.answers.len(),
            self.limit(),
            self.state.time_remaining(),
        ))
    }

    #[must_use]
    pub fn last_transition(&self) -> Option<&Transition> {
        self.last_transition.as_ref()
    }

    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    #[must_use]
    pub fn result(&self) -> Option<&ResultSummary> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn submit_attempts(&self) -> u32 {
        self.submit_attempts
    }

    #[must_use]
    pub fn abort_reason(&self) -> Option<AbortReason> {
        self.abort_reason
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let limit = self.limit();
        SessionProgress {
            limit,
            answered: self.answers.len(),
            remaining: limit.saturating_sub(self.answers.len()),
            is_complete: self.phase == SessionPhase::Done,
        }
    }

    /// Local report once the session has stopped asking questions.
    #[must_use]
    pub fn report(&self) -> Option<SessionReport> {
        let termination = self.termination?;
        Some(SessionReport::from_answers(
            &self.answers,
            |item| self.pool.get(item.question_id()).map(Question::topic),
            self.state.level,
            termination,
        ))
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn limit(&self) -> usize {
        usize::try_from(self.settings.question_limit()).unwrap_or(usize::MAX)
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn pick_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Advance {
        let picked = self
            .pool
            .select_with_fallback(self.state.level, &self.state.asked, rng)
            .map(|q| (q.id(), q.difficulty()));

        let Some((id, tier)) = picked else {
            self.begin_submission(Termination::PoolExhausted);
            return Advance::Submit(Termination::PoolExhausted);
        };

        self.state.asked.insert(id);
        self.state.current = Some(id);
        self.state.clock.reset();
        self.phase = SessionPhase::AwaitingAnswer;
        debug!(
            session_id = %self.id,
            question_id = %id,
            level = %self.state.level,
            %tier,
            "question picked"
        );
        Advance::Question(id)
    }

    fn record(&mut self, selected: SelectedOption) -> Option<RecordedAnswer> {
        let id = self.state.current?;
        let question = self.pool.get(id)?;
        let seconds = match selected {
            SelectedOption::TimedOut => self.state.clock.duration(),
            SelectedOption::Chosen(_) => self.state.clock.elapsed(),
        };
        let item = AnsweredItem::new(question, selected, seconds);
        let signal = if selected.is_timeout() {
            AnswerSignal::timed_out(seconds)
        } else {
            AnswerSignal::answered(item.is_correct(), seconds)
        };

        let transition = self
            .policy
            .next_level(self.state.level, self.state.streak, signal);
        self.state.level = transition.level;
        self.state.streak = transition.streak;
        self.state.clock.suspend();
        self.answers.push(item.clone());
        self.last_transition = Some(transition.clone());
        self.phase = SessionPhase::Adapting;

        debug!(
            session_id = %self.id,
            question_id = %id,
            correct = item.is_correct(),
            timed_out = selected.is_timeout(),
            seconds,
            level = %transition.level,
            streak = transition.streak,
            "answer recorded"
        );

        Some(RecordedAnswer {
            item,
            transition,
            answered: self.answers.len(),
        })
    }

    fn begin_submission(&mut self, termination: Termination) {
        self.state.current = None;
        self.state.clock.suspend();
        self.termination = Some(termination);
        self.phase = SessionPhase::Submitting;
        info!(
            session_id = %self.id,
            answered = self.answers.len(),
            ?termination,
            "submitting answers"
        );
    }
}

impl fmt::Debug for AdaptiveSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveSessionController")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("level", &self.state.level)
            .field("streak", &self.state.streak)
            .field("answers_len", &self.answers.len())
            .field("pool_len", &self.pool.total())
            .field("termination", &self.termination)
            .field("submit_attempts", &self.submit_attempts)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::policy::LevelChange;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;

    fn question(id: u64, tier: DifficultyTier) -> Question {
        Question::new(
            QuestionId::new(id),
            "Algorithms",
            tier,
            format!("Q{id}"),
            vec!["right".into(), "wrong".into(), "also wrong".into()],
            0,
            None,
        )
        .unwrap()
    }

    /// `per_tier` questions in each tier, ids 1.. in easy, medium, hard order.
    fn pool(per_tier: u64) -> QuestionPool {
        let mut questions = Vec::new();
        let mut id = 1;
        for tier in DifficultyTier::ALL {
            for _ in 0..per_tier {
                questions.push(question(id, tier));
                id += 1;
            }
        }
        QuestionPool::from_questions(questions).unwrap()
    }

    fn started(pool: QuestionPool, level: DifficultyTier, rng: &mut StdRng) -> AdaptiveSessionController {
        let mut session =
            AdaptiveSessionController::new(SessionSettings::default(), Vec::new(), fixed_now());
        session.start(pool, level, rng).unwrap();
        session
    }

    fn tick_n(session: &mut AdaptiveSessionController, n: u32) {
        for _ in 0..n {
            session.tick();
        }
    }

    fn recorded(outcome: AnswerOutcome) -> RecordedAnswer {
        match outcome {
            AnswerOutcome::Recorded(r) => r,
            AnswerOutcome::Ignored => panic!("answer was ignored"),
        }
    }

    #[test]
    fn start_picks_from_starting_level() {
        let mut rng = StdRng::seed_from_u64(1);
        let session = started(pool(3), DifficultyTier::Hard, &mut rng);
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
        assert_eq!(session.current_question().unwrap().difficulty(), DifficultyTier::Hard);
        assert_eq!(session.state().time_remaining(), 60);
        assert_eq!(session.state().asked().len(), 1);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = started(pool(1), DifficultyTier::Medium, &mut rng);
        let err = session.start(pool(1), DifficultyTier::Medium, &mut rng).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPhase { .. }));
    }

    #[test]
    fn empty_pool_goes_straight_to_submission() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session =
            AdaptiveSessionController::new(SessionSettings::default(), Vec::new(), fixed_now());
        let advance = session
            .start(QuestionPool::empty(), DifficultyTier::Medium, &mut rng)
            .unwrap();
        assert_eq!(advance, Advance::Submit(Termination::PoolExhausted));
        assert_eq!(session.phase(), SessionPhase::Submitting);
        assert!(session.pending_submission().unwrap().is_empty());
    }

    #[test]
    fn fast_correct_answer_promotes() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = started(pool(3), DifficultyTier::Medium, &mut rng);
        tick_n(&mut session, 10);

        let r = recorded(session.answer(0).unwrap());
        assert!(r.item.is_correct());
        assert_eq!(r.item.seconds_taken(), 10);
        assert_eq!(r.transition.change, LevelChange::Promoted);
        assert_eq!(session.state().level(), DifficultyTier::Hard);
        assert_eq!(session.state().streak(), 0);
        assert_eq!(session.phase(), SessionPhase::Adapting);
    }

    #[test]
    fn slow_wrong_answer_demotes() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = started(pool(3), DifficultyTier::Medium, &mut rng);
        tick_n(&mut session, 50);

        recorded(session.answer(1).unwrap());
        assert_eq!(session.state().level(), DifficultyTier::Easy);
        assert_eq!(session.state().streak(), 0);
    }

    #[test]
    fn timeout_records_exactly_one_incorrect_item() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = started(pool(3), DifficultyTier::Medium, &mut rng);
        tick_n(&mut session, 59);
        assert_eq!(session.answers().len(), 0);

        let TickOutcome::Expired(r) = session.tick() else {
            panic!("expected the countdown to expire");
        };
        assert!(r.item.selected().is_timeout());
        assert!(!r.item.is_correct());
        assert_eq!(r.item.seconds_taken(), 60);
        assert_eq!(r.transition.level, DifficultyTier::Easy);

        // Stray ticks and a late click are ignored.
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.answer(0).unwrap(), AnswerOutcome::Ignored);
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn second_answer_while_adapting_changes_nothing() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = started(pool(3), DifficultyTier::Medium, &mut rng);
        recorded(session.answer(0).unwrap());
        let before = session.state().clone();

        assert_eq!(session.answer(1).unwrap(), AnswerOutcome::Ignored);
        assert_eq!(session.answer(0).unwrap(), AnswerOutcome::Ignored);
        assert_eq!(session.state(), &before);
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn invalid_option_is_rejected_without_state_change() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = started(pool(3), DifficultyTier::Medium, &mut rng);
        let err = session.answer(3).unwrap_err();
        assert!(matches!(err, SessionError::InvalidOption { index: 3, len: 3 }));
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn advance_resets_clock_for_next_question() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = started(pool(3), DifficultyTier::Medium, &mut rng);
        tick_n(&mut session, 30);
        recorded(session.answer(2).unwrap());

        let first = session.answers()[0].question_id();
        let Advance::Question(next) = session.advance(&mut rng).unwrap() else {
            panic!("expected another question");
        };
        assert_ne!(next, first);
        assert_eq!(session.state().time_remaining(), 60);
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
    }

    #[test]
    fn advance_outside_adapting_is_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = started(pool(3), DifficultyTier::Medium, &mut rng);
        assert!(session.advance(&mut rng).is_err());
    }

    #[test]
    fn session_stops_at_ten_answers_without_repeats() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut session = started(pool(10), DifficultyTier::Medium, &mut rng);

        let mut outcome = None;
        for i in 0..20 {
            recorded(session.answer(i % 3).unwrap());
            if let Advance::Submit(t) = session.advance(&mut rng).unwrap() {
                outcome = Some(t);
                break;
            }
        }

        assert_eq!(outcome, Some(Termination::LimitReached));
        assert_eq!(session.answers().len(), 10);
        let ids: HashSet<_> = session.answers().iter().map(AnsweredItem::question_id).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(session.progress().remaining, 0);
    }

    #[test]
    fn exhausted_pool_forces_early_submission() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = started(pool(2), DifficultyTier::Medium, &mut rng);

        let mut advance = Advance::Question(QuestionId::new(0));
        while let Advance::Question(_) = advance {
            recorded(session.answer(0).unwrap());
            advance = session.advance(&mut rng).unwrap();
        }

        assert_eq!(advance, Advance::Submit(Termination::PoolExhausted));
        assert_eq!(session.pending_submission().unwrap().len(), 6);
        assert_eq!(session.termination(), Some(Termination::PoolExhausted));
        assert_eq!(session.report().unwrap().total(), 6);
    }

    #[test]
    fn random_answers_and_timeouts_always_end_in_submission() {
        for per_tier in [0, 1, 2, 3, 4, 10] {
            for seed in 0..40 {
                let mut rng = StdRng::seed_from_u64(seed);
                let level = *DifficultyTier::ALL.choose(&mut rng).unwrap();
                let mut session = started(pool(per_tier), level, &mut rng);

                let mut steps = 0;
                while session.phase() == SessionPhase::AwaitingAnswer {
                    steps += 1;
                    assert!(steps <= 10, "per_tier {per_tier} seed {seed}: no progress");

                    // Up to a little past the countdown, so some questions time out.
                    tick_n(&mut session, rng.random_range(0..=70));
                    if session.phase() == SessionPhase::AwaitingAnswer {
                        recorded(session.answer(rng.random_range(0..3)).unwrap());
                    }
                    assert_eq!(session.phase(), SessionPhase::Adapting);

                    // Input during the pause changes nothing.
                    assert_eq!(session.answer(0).unwrap(), AnswerOutcome::Ignored);
                    assert_eq!(session.tick(), TickOutcome::Ignored);
                    session.advance(&mut rng).unwrap();
                }

                let total = usize::try_from(per_tier * 3).unwrap();
                let answers = session.answers();
                assert_eq!(session.phase(), SessionPhase::Submitting);
                assert_eq!(answers.len(), total.min(10));
                let ids: HashSet<_> = answers.iter().map(AnsweredItem::question_id).collect();
                assert_eq!(ids.len(), answers.len());
                let expected = if total >= 10 {
                    Termination::LimitReached
                } else {
                    Termination::PoolExhausted
                };
                assert_eq!(session.termination(), Some(expected));
                assert_eq!(session.pending_submission().unwrap().len(), answers.len());
            }
        }
    }

    #[test]
    fn fallback_keeps_policy_level() {
        // Only easy questions exist; level stays where the policy put it.
        let mut rng = StdRng::seed_from_u64(8);
        let pool = QuestionPool::from_questions(vec![
            question(1, DifficultyTier::Easy),
            question(2, DifficultyTier::Easy),
        ])
        .unwrap();
        let mut session = started(pool, DifficultyTier::Hard, &mut rng);
        assert_eq!(session.current_question().unwrap().difficulty(), DifficultyTier::Easy);
        assert_eq!(session.state().level(), DifficultyTier::Hard);

        tick_n(&mut session, 20);
        recorded(session.answer(0).unwrap());
        assert_eq!(session.state().level(), DifficultyTier::Hard);
        assert_eq!(session.state().streak(), 1);
    }

    #[test]
    fn submit_failure_keeps_answers_for_retry() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = started(pool(1), DifficultyTier::Medium, &mut rng);
        for _ in 0..3 {
            recorded(session.answer(0).unwrap());
            session.advance(&mut rng).unwrap();
        }
        assert_eq!(session.phase(), SessionPhase::Submitting);

        session.record_submit_failure();
        assert_eq!(session.phase(), SessionPhase::Submitting);
        assert_eq!(session.pending_submission().unwrap().len(), 3);

        session.complete(ResultSummary::default(), fixed_now()).unwrap();
        assert_eq!(session.phase(), SessionPhase::Done);
        assert_eq!(session.submit_attempts(), 2);
        assert!(session.progress().is_complete);
    }

    #[test]
    fn abort_is_terminal_and_blocks_input() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut session = started(pool(2), DifficultyTier::Medium, &mut rng);
        session.abort(AbortReason::Cancelled);
        assert_eq!(session.phase(), SessionPhase::Aborted);
        assert_eq!(session.answer(0).unwrap(), AnswerOutcome::Ignored);
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert!(session.view().is_none());

        session.abort(AbortReason::FetchFailed);
        assert_eq!(session.abort_reason(), Some(AbortReason::Cancelled));
    }

    #[test]
    fn mastery_streak_grows_at_hard() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = started(pool(4), DifficultyTier::Hard, &mut rng);
        for expected in 1..=3 {
            tick_n(&mut session, 5);
            let r = recorded(session.answer(0).unwrap());
            assert_eq!(r.transition.change, LevelChange::Mastery);
            assert_eq!(session.state().streak(), expected);
            session.advance(&mut rng).unwrap();
        }
    }

    #[test]
    fn view_describes_current_question() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut session = started(pool(2), DifficultyTier::Easy, &mut rng);
        tick_n(&mut session, 4);
        let view = session.view().unwrap();
        assert_eq!(view.number, 1);
        assert_eq!(view.limit, 10);
        assert_eq!(view.tier, DifficultyTier::Easy);
        assert_eq!(view.remaining_secs, 56);
        assert!(view.insight.starts_with("Baseline check"));
    }
}
