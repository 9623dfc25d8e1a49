use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::games::GameInput;

/// Unified event type consumed by the game runner
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Input(GameInput),
    Restart,
    Quit,
    Tick,
}

/// Map a key press to a game event.
///
/// `a`-`p` flip cards, `1`-`9` press digits, space clicks, enter starts,
/// `r` restarts and `q`, Esc or ctrl+c quit.
pub fn map_key(key: KeyEvent) -> Option<GameEvent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(GameEvent::Quit);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(GameEvent::Quit),
        KeyCode::Char('r') => Some(GameEvent::Restart),
        KeyCode::Enter => Some(GameEvent::Input(GameInput::Start)),
        KeyCode::Char(' ') => Some(GameEvent::Input(GameInput::Click)),
        KeyCode::Char(c @ '1'..='9') => Some(GameEvent::Input(GameInput::Digit(c as u8 - b'0'))),
        KeyCode::Char(c @ 'a'..='p') => Some(GameEvent::Input(GameInput::Card((c as u8 - b'a') as usize))),
        _ => None,
    }
}

/// Source of game events (keyboard, test channel, ...)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if let Some(ev) = map_key(key) {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances a session one event/tick at a time
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn key(c: KeyCode) -> KeyEvent {
        KeyEvent::new(c, KeyModifiers::NONE)
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        assert_eq!(runner.step(), GameEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Input(GameInput::Click)).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        assert_eq!(runner.step(), GameEvent::Input(GameInput::Click));
    }

    #[test]
    fn keys_map_to_game_inputs() {
        assert_eq!(map_key(key(KeyCode::Char('a'))), Some(GameEvent::Input(GameInput::Card(0))));
        assert_eq!(map_key(key(KeyCode::Char('p'))), Some(GameEvent::Input(GameInput::Card(15))));
        assert_eq!(map_key(key(KeyCode::Char('7'))), Some(GameEvent::Input(GameInput::Digit(7))));
        assert_eq!(map_key(key(KeyCode::Char(' '))), Some(GameEvent::Input(GameInput::Click)));
        assert_eq!(map_key(key(KeyCode::Enter)), Some(GameEvent::Input(GameInput::Start)));
        assert_eq!(map_key(key(KeyCode::Char('r'))), Some(GameEvent::Restart));
        assert_eq!(map_key(key(KeyCode::Esc)), Some(GameEvent::Quit));
        assert_eq!(map_key(key(KeyCode::Char('0'))), None);
        assert_eq!(map_key(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn ctrl_c_quits() {
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ev), Some(GameEvent::Quit));
    }
}
