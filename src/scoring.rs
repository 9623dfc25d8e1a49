//! Pure scoring formulas, one per game variant.

use crate::util::mean;
use serde::{Deserialize, Serialize};

/// Raw outcome of a finished session, before range clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub score: u32,
    pub duration_ms: f64,
    pub accuracy_pct: f64,
}

/// `score = max(0, 100 - 2 * moves)`, `accuracy = pairs / moves * 100`.
///
/// A completed board always needs at least one move per pair, so `moves == 0`
/// only happens for a degenerate board; accuracy is reported as 0 there.
pub fn memory_match(pairs: usize, moves: u32, duration_ms: u64) -> GameScore {
    let score = 100u32.saturating_sub(moves.saturating_mul(2));
    let accuracy_pct = if moves == 0 {
        0.0
    } else {
        pairs as f64 / moves as f64 * 100.0
    };

    GameScore {
        score,
        duration_ms: duration_ms as f64,
        accuracy_pct,
    }
}

/// `score = max(0, round(100 - (avg - 200) / 10))` over the recorded reaction
/// times. Returns `None` when no times were recorded.
pub fn reaction_time(times_ms: &[u64]) -> Option<GameScore> {
    let samples: Vec<f64> = times_ms.iter().map(|t| *t as f64).collect();
    let avg = mean(&samples)?;
    let raw = 100.0 - (avg - 200.0) / 10.0;

    Some(GameScore {
        score: raw.round().max(0.0) as u32,
        duration_ms: avg,
        accuracy_pct: 100.0,
    })
}

/// Accumulated points; accuracy is relative to the failed level's reward,
/// or 100 when every level was cleared.
pub fn sequence_recall(points: u32, level: u32, cleared: bool, nominal_duration_ms: u64) -> GameScore {
    let accuracy_pct = if cleared {
        100.0
    } else if level == 0 {
        0.0
    } else {
        points as f64 / (level as f64 * 10.0) * 100.0
    };

    GameScore {
        score: points,
        duration_ms: nominal_duration_ms as f64,
        accuracy_pct,
    }
}
