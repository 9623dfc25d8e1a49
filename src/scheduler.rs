use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Milliseconds on a session clock.
pub type Millis = u64;

/// Source of the current time for game sessions.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Wall clock measured from the moment it was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Clock that only moves when told to. Used by tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Millis) -> Millis {
        self.now.fetch_add(by, Ordering::SeqCst) + by
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// An event due for delivery at `due_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled<E> {
    pub due_at: Millis,
    pub event: E,
}

/// Single-threaded queue of timed events, kept sorted by due time.
/// Entries with equal due times are delivered in insertion order.
#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    entries: VecDeque<Scheduled<E>>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn schedule(&mut self, due_at: Millis, event: E) {
        let pos = self
            .entries
            .iter()
            .position(|s| s.due_at > due_at)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, Scheduled { due_at, event });
    }

    /// Remove and return the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<Scheduled<E>> {
        match self.entries.front() {
            Some(s) if s.due_at <= now => self.entries.pop_front(),
            _ => None,
        }
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.entries.front().map(|s| s.due_at)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
