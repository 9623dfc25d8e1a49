use super::{Effect, GameInput, GameKind, GameTimer, GameVariant, InputOutcome, Phase, TimerCommand};
use crate::config::GameConfig;
use crate::scheduler::Millis;
use crate::scoring::{self, GameScore};
use itertools::Itertools;
use rand::{Rng, RngCore};
use std::any::Any;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Ready,
    /// Showing `sequence[index]`; `lit` is false during the gap after it.
    Playback { index: usize, lit: bool },
    /// Expecting `sequence[position]`.
    Input { position: usize },
    LevelCleared,
    Failed,
    Complete,
}

/// Watch a digit sequence, then repeat it. Each level adds one digit.
#[derive(Debug, Clone)]
pub struct SequenceRecall {
    max_level: u32,
    highlight_ms: Millis,
    pause_ms: Millis,
    level_pause_ms: Millis,
    nominal_duration_ms: Millis,
    state: SequenceState,
    level: u32,
    points: u32,
    sequence: Vec<u8>,
    entered: Vec<u8>,
    started: bool,
}

impl SequenceRecall {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            max_level: config.sequence_max_level.max(1),
            highlight_ms: config.sequence_highlight_ms,
            pause_ms: config.sequence_pause_ms,
            level_pause_ms: config.sequence_level_pause_ms,
            nominal_duration_ms: config.sequence_nominal_duration_ms,
            state: SequenceState::Ready,
            level: 1,
            points: 0,
            sequence: Vec::new(),
            entered: Vec::new(),
            started: false,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn entered(&self) -> &[u8] {
        &self.entered
    }

    /// Digit currently lit during playback.
    pub fn highlighted(&self) -> Option<u8> {
        match self.state {
            SequenceState::Playback { index, lit: true } => self.sequence.get(index).copied(),
            _ => None,
        }
    }

    fn begin_level(&mut self, rng: &mut dyn RngCore) -> TimerCommand {
        let len = self.level as usize + 2;
        self.sequence = (0..len).map(|_| rng.gen_range(1..=9)).collect();
        self.entered.clear();
        self.state = SequenceState::Playback {
            index: 0,
            lit: true,
        };
        TimerCommand::after(self.highlight_ms, GameTimer::PlaybackStep)
    }

    fn step_playback(&mut self, index: usize, lit: bool) -> TimerCommand {
        if lit {
            self.state = SequenceState::Playback { index, lit: false };
            return TimerCommand::after(self.pause_ms, GameTimer::PlaybackStep);
        }

        let next = index + 1;
        if next < self.sequence.len() {
            self.state = SequenceState::Playback {
                index: next,
                lit: true,
            };
            TimerCommand::after(self.highlight_ms, GameTimer::PlaybackStep)
        } else {
            self.state = SequenceState::Input { position: 0 };
            TimerCommand::Keep
        }
    }
}

impl GameVariant for SequenceRecall {
    fn kind(&self) -> GameKind {
        GameKind::SequenceRecall
    }

    fn reset(&mut self, _rng: &mut dyn RngCore) {
        self.state = SequenceState::Ready;
        self.level = 1;
        self.points = 0;
        self.sequence.clear();
        self.entered.clear();
        self.started = false;
    }

    fn start(&mut self, _now: Millis, _rng: &mut dyn RngCore) -> TimerCommand {
        self.started = true;
        TimerCommand::Keep
    }

    fn submit_input(&mut self, input: GameInput, _now: Millis, rng: &mut dyn RngCore) -> Effect {
        if !self.started {
            return Effect::ignored();
        }

        match (self.state, input) {
            (SequenceState::Ready, GameInput::Start | GameInput::Click) => {
                let timer = self.begin_level(rng);
                Effect::accepted(None).with_timer(timer)
            }
            (SequenceState::Input { position }, GameInput::Digit(d)) if (1..=9).contains(&d) => {
                self.entered.push(d);
                if self.sequence.get(position) != Some(&d) {
                    self.state = SequenceState::Failed;
                    return Effect {
                        outcome: InputOutcome::Mismatch,
                        timer: TimerCommand::Cancel,
                    };
                }

                let next = position + 1;
                if next < self.sequence.len() {
                    self.state = SequenceState::Input { position: next };
                    return Effect::accepted(Some(true));
                }

                self.points += self.level * 10;
                if self.level >= self.max_level {
                    self.state = SequenceState::Complete;
                    Effect::accepted(Some(true))
                } else {
                    self.state = SequenceState::LevelCleared;
                    Effect::accepted(Some(true))
                        .with_timer(TimerCommand::after(self.level_pause_ms, GameTimer::NextLevel))
                }
            }
            _ => Effect::ignored(),
        }
    }

    fn on_timer(&mut self, timer: GameTimer, _now: Millis, rng: &mut dyn RngCore) -> TimerCommand {
        match (self.state, timer) {
            (SequenceState::Playback { index, lit }, GameTimer::PlaybackStep) => {
                self.step_playback(index, lit)
            }
            (SequenceState::LevelCleared, GameTimer::NextLevel) => {
                self.level += 1;
                self.begin_level(rng)
            }
            _ => TimerCommand::Keep,
        }
    }

    fn phase(&self) -> Phase {
        match (self.started, self.state) {
            (false, _) => Phase::Ready,
            (true, SequenceState::Failed) => Phase::Failed,
            (true, SequenceState::Complete) => Phase::Complete,
            (true, _) => Phase::Active,
        }
    }

    fn compute_result(&self) -> Option<GameScore> {
        match self.state {
            SequenceState::Failed => Some(scoring::sequence_recall(
                self.points,
                self.level,
                false,
                self.nominal_duration_ms,
            )),
            SequenceState::Complete => Some(scoring::sequence_recall(
                self.points,
                self.level,
                true,
                self.nominal_duration_ms,
            )),
            _ => None,
        }
    }

    fn difficulty_level(&self) -> u32 {
        self.level
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for SequenceRecall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Level: {}   Score: {}   Sequence: {}",
            self.level,
            self.points,
            self.sequence.len()
        )?;
        match self.state {
            SequenceState::Ready => writeln!(f, "Press enter to watch the sequence.")?,
            SequenceState::Playback { .. } => match self.highlighted() {
                Some(d) => writeln!(f, "Watch the sequence...  [{d}]")?,
                None => writeln!(f, "Watch the sequence...  [ ]")?,
            },
            SequenceState::Input { .. } => {
                writeln!(f, "Your turn! Repeat the sequence: {}", self.entered.iter().join(" "))?
            }
            SequenceState::LevelCleared => {
                writeln!(f, "Correct! Moving to level {}...", self.level + 1)?
            }
            SequenceState::Failed => writeln!(
                f,
                "Game over. You reached level {} with a score of {}",
                self.level, self.points
            )?,
            SequenceState::Complete => {
                writeln!(f, "You completed all levels with a score of {}!", self.points)?
            }
        }
        Ok(())
    }
}
