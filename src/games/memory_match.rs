use super::{Effect, GameInput, GameKind, GameTimer, GameVariant, Phase, TimerCommand};
use crate::config::GameConfig;
use crate::scheduler::Millis;
use crate::scoring::{self, GameScore};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;

pub const SYMBOLS: [char; 8] = ['🧠', '❤', '⭐', '🎯', '🎨', '🎵', '🌟', '💡'];

/// Classic pairs game: flip two cards, keep them if they match.
#[derive(Debug, Clone)]
pub struct MemoryMatch {
    pair_count: usize,
    reveal_ms: Millis,
    cards: Vec<char>,
    flipped: Vec<usize>,
    matched: BTreeSet<usize>,
    moves: u32,
    started_at: Option<Millis>,
    completed_at: Option<Millis>,
}

impl MemoryMatch {
    pub fn new(config: &GameConfig, rng: &mut dyn RngCore) -> Self {
        let mut game = Self {
            pair_count: config.pair_count.clamp(1, SYMBOLS.len()),
            reveal_ms: config.mismatch_reveal_ms,
            cards: Vec::new(),
            flipped: Vec::new(),
            matched: BTreeSet::new(),
            moves: 0,
            started_at: None,
            completed_at: None,
        };
        game.reset(rng);
        game
    }

    pub fn cards(&self) -> &[char] {
        &self.cards
    }

    pub fn flipped(&self) -> &[usize] {
        &self.flipped
    }

    pub fn matched(&self) -> &BTreeSet<usize> {
        &self.matched
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    pub fn is_face_up(&self, idx: usize) -> bool {
        self.flipped.contains(&idx) || self.matched.contains(&idx)
    }

    fn accepts_flip(&self, idx: usize) -> bool {
        self.started_at.is_some()
            && self.completed_at.is_none()
            && self.flipped.len() < 2
            && idx < self.cards.len()
            && !self.is_face_up(idx)
    }
}

impl GameVariant for MemoryMatch {
    fn kind(&self) -> GameKind {
        GameKind::MemoryMatch
    }

    fn reset(&mut self, rng: &mut dyn RngCore) {
        let mut cards: Vec<char> = SYMBOLS[..self.pair_count]
            .iter()
            .chain(SYMBOLS[..self.pair_count].iter())
            .copied()
            .collect();
        cards.shuffle(rng);

        self.cards = cards;
        self.flipped.clear();
        self.matched.clear();
        self.moves = 0;
        self.started_at = None;
        self.completed_at = None;
    }

    fn start(&mut self, now: Millis, _rng: &mut dyn RngCore) -> TimerCommand {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        TimerCommand::Keep
    }

    fn submit_input(&mut self, input: GameInput, now: Millis, _rng: &mut dyn RngCore) -> Effect {
        let GameInput::Card(idx) = input else {
            return Effect::ignored();
        };
        if !self.accepts_flip(idx) {
            return Effect::ignored();
        }

        self.flipped.push(idx);
        if self.flipped.len() < 2 {
            return Effect::accepted(None);
        }

        self.moves += 1;
        let (first, second) = (self.flipped[0], self.flipped[1]);
        if self.cards[first] == self.cards[second] {
            self.matched.insert(first);
            self.matched.insert(second);
            self.flipped.clear();
            if self.matched.len() == self.cards.len() {
                self.completed_at = Some(now);
            }
            Effect::accepted(Some(true))
        } else {
            Effect::accepted(Some(false))
                .with_timer(TimerCommand::after(self.reveal_ms, GameTimer::HideMismatch))
        }
    }

    fn on_timer(&mut self, timer: GameTimer, _now: Millis, _rng: &mut dyn RngCore) -> TimerCommand {
        if timer == GameTimer::HideMismatch && self.flipped.len() == 2 {
            self.flipped.clear();
        }
        TimerCommand::Keep
    }

    fn phase(&self) -> Phase {
        match (self.started_at, self.completed_at) {
            (None, _) => Phase::Ready,
            (Some(_), None) => Phase::Active,
            (Some(_), Some(_)) => Phase::Complete,
        }
    }

    fn compute_result(&self) -> Option<GameScore> {
        let started = self.started_at?;
        let completed = self.completed_at?;
        Some(scoring::memory_match(
            self.pair_count,
            self.moves,
            completed.saturating_sub(started),
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for MemoryMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Moves: {}   Matched: {} / {}",
            self.moves,
            self.matched.len() / 2,
            self.pair_count
        )?;
        for (row_idx, row) in self.cards.chunks(4).enumerate() {
            let line = row
                .iter()
                .enumerate()
                .map(|(col, symbol)| {
                    let idx = row_idx * 4 + col;
                    let label = (b'a' + idx as u8) as char;
                    if self.is_face_up(idx) {
                        format!("{label}:{symbol}")
                    } else {
                        format!("{label}:?")
                    }
                })
                .join("  ");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
