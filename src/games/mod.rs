//! Game variants and the state-machine contract they share.

pub mod memory_match;
pub mod reaction_time;
pub mod sequence_recall;

pub use memory_match::MemoryMatch;
pub use reaction_time::ReactionTime;
pub use sequence_recall::SequenceRecall;

use crate::config::GameConfig;
use crate::scheduler::Millis;
use crate::scoring::GameScore;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    #[strum(serialize = "memory_match")]
    MemoryMatch,
    #[serde(rename = "reaction_test")]
    #[strum(serialize = "reaction_test")]
    ReactionTime,
    #[strum(serialize = "sequence_recall")]
    SequenceRecall,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [
        GameKind::MemoryMatch,
        GameKind::ReactionTime,
        GameKind::SequenceRecall,
    ];

    /// Stable key used in storage and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::MemoryMatch => "memory_match",
            GameKind::ReactionTime => "reaction_test",
            GameKind::SequenceRecall => "sequence_recall",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::MemoryMatch => "Memory Match",
            GameKind::ReactionTime => "Reaction Time",
            GameKind::SequenceRecall => "Sequence Recall",
        }
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown game type: {s}"))
    }
}

/// A single player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameInput {
    /// Begin the next round or level.
    Start,
    /// Flip the card at this board index.
    Card(usize),
    /// Click the reaction target.
    Click,
    /// Press a digit key (1-9).
    Digit(u8),
}

/// Coarse lifecycle shared by every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Active,
    Complete,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Failed)
    }
}

/// How a variant treated an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Arrived outside an input-accepting state and was dropped.
    Ignored,
    /// Consumed; `correct` is set when the variant can judge the input.
    Accepted { correct: Option<bool> },
    /// Reaction click before the window opened; the round restarts.
    EarlyInput,
    /// Wrong digit in sequence recall; the session has failed.
    Mismatch,
}

impl InputOutcome {
    pub fn was_ignored(&self) -> bool {
        matches!(self, InputOutcome::Ignored)
    }

    pub fn correctness(&self) -> Option<bool> {
        match self {
            InputOutcome::Ignored => None,
            InputOutcome::Accepted { correct } => *correct,
            InputOutcome::EarlyInput | InputOutcome::Mismatch => Some(false),
        }
    }
}

/// Timer events a variant can ask to have delivered later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameTimer {
    HideMismatch,
    OpenWindow,
    PlaybackStep,
    NextLevel,
}

/// What should happen to the session's pending timer after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Keep,
    Schedule { delay_ms: Millis, timer: GameTimer },
    Cancel,
}

impl TimerCommand {
    pub fn after(delay_ms: Millis, timer: GameTimer) -> Self {
        TimerCommand::Schedule { delay_ms, timer }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    pub outcome: InputOutcome,
    pub timer: TimerCommand,
}

impl Effect {
    pub fn ignored() -> Self {
        Self {
            outcome: InputOutcome::Ignored,
            timer: TimerCommand::Keep,
        }
    }

    pub fn accepted(correct: Option<bool>) -> Self {
        Self {
            outcome: InputOutcome::Accepted { correct },
            timer: TimerCommand::Keep,
        }
    }

    pub fn with_timer(mut self, timer: TimerCommand) -> Self {
        self.timer = timer;
        self
    }
}

/// State machine contract for a mini-game.
///
/// Implementations are driven by a `GameSession`, which owns the clock, the
/// random source and the single pending timer. Every method must be total:
/// an input or timer that does not fit the current state is dropped.
pub trait GameVariant: fmt::Display + Send {
    fn kind(&self) -> GameKind;

    /// Reinitialize to the pre-start state with a fresh board or sequence.
    fn reset(&mut self, rng: &mut dyn RngCore);

    fn start(&mut self, now: Millis, rng: &mut dyn RngCore) -> TimerCommand;

    fn submit_input(&mut self, input: GameInput, now: Millis, rng: &mut dyn RngCore) -> Effect;

    fn on_timer(&mut self, timer: GameTimer, now: Millis, rng: &mut dyn RngCore) -> TimerCommand;

    fn phase(&self) -> Phase;

    fn is_complete(&self) -> bool {
        self.phase().is_terminal()
    }

    /// Score for a finished game; `None` until a terminal phase is reached.
    fn compute_result(&self) -> Option<GameScore>;

    fn difficulty_level(&self) -> u32 {
        1
    }

    fn as_any(&self) -> &dyn Any;
}

/// Build the variant implementing `kind`, already reset with `rng`.
pub fn new_variant(
    kind: GameKind,
    config: &GameConfig,
    rng: &mut dyn RngCore,
) -> Box<dyn GameVariant> {
    match kind {
        GameKind::MemoryMatch => Box::new(MemoryMatch::new(config, rng)),
        GameKind::ReactionTime => Box::new(ReactionTime::new(config)),
        GameKind::SequenceRecall => Box::new(SequenceRecall::new(config)),
    }
}
