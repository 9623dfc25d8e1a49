use crate::config::GameConfig;
use crate::error::Result;
use crate::games::{new_variant, GameInput, GameKind, GameTimer, GameVariant, InputOutcome, Phase, TimerCommand};
use crate::recorder::ResultRecorder;
use crate::result::GameResult;
use crate::scheduler::{EventQueue, Millis};
use crate::scoring::GameScore;
use chrono::Utc;
use rand::RngCore;
use std::any::Any;
use tracing::{debug, info};

/// One player action as it was applied to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptEvent {
    pub at: Millis,
    pub input: GameInput,
    pub correct: Option<bool>,
}

type CompletionCallback = Box<dyn FnMut(&GameScore) + Send>;

/// A single play-through of one game variant.
///
/// The session owns the variant, its random source, the one pending timer
/// and the attempt log. When the variant reaches a terminal phase the score
/// is computed once, the completion callback runs once and the result is
/// handed to the recorder once.
pub struct GameSession {
    variant: Box<dyn GameVariant>,
    rng: Box<dyn RngCore + Send>,
    timers: EventQueue<GameTimer>,
    attempts: Vec<AttemptEvent>,
    started_at: Option<Millis>,
    score: Option<GameScore>,
    result: Option<GameResult>,
    recorder: Option<ResultRecorder>,
    on_complete: Option<CompletionCallback>,
}

impl GameSession {
    pub fn new(kind: GameKind, config: &GameConfig, mut rng: Box<dyn RngCore + Send>) -> Self {
        let variant = new_variant(kind, config, &mut *rng);
        Self::with_variant(variant, rng)
    }

    pub fn with_variant(variant: Box<dyn GameVariant>, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            variant,
            rng,
            timers: EventQueue::new(),
            attempts: Vec::new(),
            started_at: None,
            score: None,
            result: None,
            recorder: None,
            on_complete: None,
        }
    }

    pub fn with_recorder(mut self, recorder: ResultRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&GameScore) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn kind(&self) -> GameKind {
        self.variant.kind()
    }

    pub fn variant(&self) -> &dyn GameVariant {
        self.variant.as_ref()
    }

    /// Concrete view of the variant, e.g. to read the board.
    pub fn variant_as<T: Any>(&self) -> Option<&T> {
        self.variant.as_any().downcast_ref::<T>()
    }

    pub fn phase(&self) -> Phase {
        self.variant.phase()
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.score.is_some()
    }

    pub fn started_at(&self) -> Option<Millis> {
        self.started_at
    }

    pub fn attempts(&self) -> &[AttemptEvent] {
        &self.attempts
    }

    pub fn next_timer_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    /// Raw score of the finished session.
    pub fn score(&self) -> Option<&GameScore> {
        self.score.as_ref()
    }

    /// Clamped result handed to the recorder.
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn start(&mut self, now: Millis) {
        if self.started_at.is_some() {
            return;
        }
        self.started_at = Some(now);
        let cmd = self.variant.start(now, &mut *self.rng);
        self.apply_timer(cmd, now);
        debug!(game = %self.kind(), now, "session started");
    }

    /// Apply one player input. Inputs the current state does not accept are
    /// dropped and reported as `Ignored`.
    ///
    /// Timers already due at `now` are delivered first, so the input sees
    /// the state it would have seen on a timely poll.
    ///
    /// Returns an error only when this call finished the game and the
    /// recorder could not store the result; the session itself stays valid.
    pub fn submit_input(&mut self, input: GameInput, now: Millis) -> Result<InputOutcome> {
        if self.started_at.is_none() || self.is_complete() {
            return Ok(InputOutcome::Ignored);
        }
        self.advance(now)?;
        if self.is_complete() {
            return Ok(InputOutcome::Ignored);
        }

        let effect = self.variant.submit_input(input, now, &mut *self.rng);
        if effect.outcome.was_ignored() {
            return Ok(effect.outcome);
        }

        self.attempts.push(AttemptEvent {
            at: now,
            input,
            correct: effect.outcome.correctness(),
        });
        self.apply_timer(effect.timer, now);
        debug!(game = %self.kind(), ?input, outcome = ?effect.outcome, "input applied");

        self.finish_if_terminal()?;
        Ok(effect.outcome)
    }

    /// Deliver every timer due at or before `now`, each at its own due time.
    /// Returns how many timers fired.
    pub fn advance(&mut self, now: Millis) -> Result<usize> {
        let mut fired = 0;
        while !self.is_complete() {
            let Some(due) = self.timers.pop_due(now) else {
                break;
            };
            let cmd = self.variant.on_timer(due.event, due.due_at, &mut *self.rng);
            self.apply_timer(cmd, due.due_at);
            fired += 1;
            self.finish_if_terminal()?;
        }
        Ok(fired)
    }

    /// Abandon the current play-through and begin a fresh one at `now`.
    /// Pending timers and the attempt log are discarded; no result is
    /// recorded for the abandoned play.
    pub fn restart(&mut self, now: Millis) {
        self.timers.clear();
        self.attempts.clear();
        self.score = None;
        self.result = None;
        self.started_at = None;
        self.variant.reset(&mut *self.rng);
        debug!(game = %self.kind(), "session restarted");
        self.start(now);
    }

    fn apply_timer(&mut self, cmd: TimerCommand, now: Millis) {
        match cmd {
            TimerCommand::Keep => {}
            TimerCommand::Cancel => self.timers.clear(),
            TimerCommand::Schedule { delay_ms, timer } => {
                // A session never has more than one timer in flight.
                self.timers.clear();
                self.timers.schedule(now.saturating_add(delay_ms), timer);
            }
        }
    }

    fn finish_if_terminal(&mut self) -> Result<()> {
        if self.score.is_some() || !self.variant.is_complete() {
            return Ok(());
        }
        let Some(score) = self.variant.compute_result() else {
            return Ok(());
        };

        self.timers.clear();
        let result = GameResult::from_score(
            self.kind(),
            &score,
            self.variant.difficulty_level(),
            Utc::now(),
        );
        info!(
            game = %self.kind(),
            phase = ?self.variant.phase(),
            score = score.score,
            accuracy = score.accuracy_pct,
            duration_ms = score.duration_ms,
            "session finished"
        );

        self.score = Some(score);
        self.result = Some(result.clone());

        if let Some(callback) = self.on_complete.as_mut() {
            (*callback)(&score);
        }
        match &self.recorder {
            Some(recorder) => recorder.record(result),
            None => Ok(()),
        }
    }
}
