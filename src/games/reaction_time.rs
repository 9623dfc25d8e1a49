use super::{Effect, GameInput, GameKind, GameTimer, GameVariant, InputOutcome, Phase, TimerCommand};
use crate::config::GameConfig;
use crate::scheduler::Millis;
use crate::scoring::{self, GameScore};
use itertools::Itertools;
use rand::{Rng, RngCore};
use std::any::Any;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionState {
    /// Waiting for the player to begin the next round.
    Ready,
    /// Target hidden; a click now is too early.
    Waiting,
    /// Target shown since `opened_at`.
    ClickWindow { opened_at: Millis },
    /// All rounds recorded.
    Result,
}

/// Click as soon as the target appears, over a fixed number of rounds.
#[derive(Debug, Clone)]
pub struct ReactionTime {
    rounds: usize,
    min_delay_ms: Millis,
    max_delay_ms: Millis,
    state: ReactionState,
    times: Vec<u64>,
    early_clicks: u32,
    started: bool,
}

impl ReactionTime {
    pub fn new(config: &GameConfig) -> Self {
        let min_delay_ms = config.reaction_min_delay_ms.min(Millis::MAX - 1);
        Self {
            rounds: config.reaction_rounds.max(1),
            min_delay_ms,
            max_delay_ms: config.reaction_max_delay_ms.max(min_delay_ms.saturating_add(1)),
            state: ReactionState::Ready,
            times: Vec::new(),
            early_clicks: 0,
            started: false,
        }
    }

    pub fn state(&self) -> ReactionState {
        self.state
    }

    pub fn reaction_times(&self) -> &[u64] {
        &self.times
    }

    pub fn early_clicks(&self) -> u32 {
        self.early_clicks
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

impl GameVariant for ReactionTime {
    fn kind(&self) -> GameKind {
        GameKind::ReactionTime
    }

    fn reset(&mut self, _rng: &mut dyn RngCore) {
        self.state = ReactionState::Ready;
        self.times.clear();
        self.early_clicks = 0;
        self.started = false;
    }

    fn start(&mut self, _now: Millis, _rng: &mut dyn RngCore) -> TimerCommand {
        self.started = true;
        TimerCommand::Keep
    }

    fn submit_input(&mut self, input: GameInput, now: Millis, rng: &mut dyn RngCore) -> Effect {
        if !self.started {
            return Effect::ignored();
        }

        match (self.state, input) {
            (ReactionState::Ready, GameInput::Start | GameInput::Click) => {
                self.state = ReactionState::Waiting;
                let delay = rng.gen_range(self.min_delay_ms..self.max_delay_ms);
                Effect::accepted(None).with_timer(TimerCommand::after(delay, GameTimer::OpenWindow))
            }
            (ReactionState::Waiting, GameInput::Click) => {
                self.early_clicks += 1;
                self.state = ReactionState::Ready;
                Effect {
                    outcome: InputOutcome::EarlyInput,
                    timer: TimerCommand::Cancel,
                }
            }
            (ReactionState::ClickWindow { opened_at }, GameInput::Click) => {
                self.times.push(now.saturating_sub(opened_at));
                self.state = if self.times.len() >= self.rounds {
                    ReactionState::Result
                } else {
                    ReactionState::Ready
                };
                Effect::accepted(Some(true))
            }
            _ => Effect::ignored(),
        }
    }

    fn on_timer(&mut self, timer: GameTimer, now: Millis, _rng: &mut dyn RngCore) -> TimerCommand {
        if timer == GameTimer::OpenWindow && self.state == ReactionState::Waiting {
            self.state = ReactionState::ClickWindow { opened_at: now };
        }
        TimerCommand::Keep
    }

    fn phase(&self) -> Phase {
        match (self.started, self.state) {
            (false, _) => Phase::Ready,
            (true, ReactionState::Result) => Phase::Complete,
            (true, _) => Phase::Active,
        }
    }

    fn compute_result(&self) -> Option<GameScore> {
        if self.state != ReactionState::Result {
            return None;
        }
        scoring::reaction_time(&self.times)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for ReactionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let round = (self.times.len() + 1).min(self.rounds);
        writeln!(f, "Round {} of {}", round, self.rounds)?;
        match self.state {
            ReactionState::Ready => writeln!(f, "Ready? Press space to start the round.")?,
            ReactionState::Waiting => writeln!(f, "Wait...")?,
            ReactionState::ClickWindow { .. } => writeln!(f, "CLICK NOW!")?,
            ReactionState::Result => writeln!(f, "Complete!")?,
        }
        if !self.times.is_empty() {
            let times = self.times.iter().map(|t| format!("{t}ms")).join(", ");
            writeln!(f, "Times: {}", times)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn started_game() -> (ReactionTime, StdRng) {
        let mut rng = StdRng::seed_from_u64(21);
        let mut game = ReactionTime::new(&GameConfig::default());
        game.start(0, &mut rng);
        (game, rng)
    }

    fn open_window(game: &mut ReactionTime, rng: &mut StdRng, now: Millis) -> Millis {
        let effect = game.submit_input(GameInput::Start, now, rng);
        let TimerCommand::Schedule { delay_ms, timer } = effect.timer else {
            panic!("expected the window timer to be scheduled");
        };
        assert_eq!(timer, GameTimer::OpenWindow);
        assert!((1_000..4_000).contains(&delay_ms));
        let opened = now + delay_ms;
        game.on_timer(GameTimer::OpenWindow, opened, rng);
        opened
    }

    #[test]
    fn round_records_latency_from_window_open() {
        let (mut game, mut rng) = started_game();
        let opened = open_window(&mut game, &mut rng, 0);
        assert_matches!(game.state(), ReactionState::ClickWindow { .. });

        let effect = game.submit_input(GameInput::Click, opened + 250, &mut rng);
        assert_eq!(effect.outcome, InputOutcome::Accepted { correct: Some(true) });
        assert_eq!(game.reaction_times(), &[250]);
        assert_eq!(game.state(), ReactionState::Ready);
    }

    #[test]
    fn early_click_resets_round_without_recording() {
        let (mut game, mut rng) = started_game();
        game.submit_input(GameInput::Click, 0, &mut rng);
        assert_eq!(game.state(), ReactionState::Waiting);

        let effect = game.submit_input(GameInput::Click, 500, &mut rng);
        assert_eq!(effect.outcome, InputOutcome::EarlyInput);
        assert_eq!(effect.timer, TimerCommand::Cancel);
        assert_eq!(game.state(), ReactionState::Ready);
        assert!(game.reaction_times().is_empty());
        assert_eq!(game.early_clicks(), 1);

        // A stale window timer after the fault must not open the window.
        game.on_timer(GameTimer::OpenWindow, 3_000, &mut rng);
        assert_eq!(game.state(), ReactionState::Ready);
    }

    #[test]
    fn clicks_while_ready_start_rounds_and_digits_are_ignored() {
        let (mut game, mut rng) = started_game();
        assert_eq!(
            game.submit_input(GameInput::Digit(3), 0, &mut rng),
            Effect::ignored()
        );
        let opened = open_window(&mut game, &mut rng, 0);
        assert_eq!(
            game.submit_input(GameInput::Start, opened + 1, &mut rng),
            Effect::ignored()
        );
    }

    #[test]
    fn five_baseline_rounds_score_100() {
        let (mut game, mut rng) = started_game();
        let mut now = 0;
        for round in 0..5 {
            let opened = open_window(&mut game, &mut rng, now);
            now = opened + 200;
            game.submit_input(GameInput::Click, now, &mut rng);
            assert_eq!(game.reaction_times().len(), round + 1);
        }

        assert_eq!(game.phase(), Phase::Complete);
        let score = game.compute_result().unwrap();
        assert_eq!(score.score, 100);
        assert_eq!(score.duration_ms, 200.0);
        assert_eq!(score.accuracy_pct, 100.0);

        assert_eq!(
            game.submit_input(GameInput::Click, now + 10, &mut rng),
            Effect::ignored()
        );
    }

    #[test]
    fn no_result_before_final_round() {
        let (mut game, mut rng) = started_game();
        let opened = open_window(&mut game, &mut rng, 0);
        game.submit_input(GameInput::Click, opened + 300, &mut rng);
        assert!(game.compute_result().is_none());
        assert_eq!(game.phase(), Phase::Active);
    }

    #[test]
    fn extreme_delay_config_does_not_overflow() {
        let config = GameConfig {
            reaction_min_delay_ms: u64::MAX,
            reaction_max_delay_ms: 0,
            ..GameConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = ReactionTime::new(&config);
        game.start(0, &mut rng);

        let effect = game.submit_input(GameInput::Start, 0, &mut rng);
        assert_eq!(effect.timer, TimerCommand::after(u64::MAX - 1, GameTimer::OpenWindow));
        assert_eq!(game.state(), ReactionState::Waiting);
    }
}
