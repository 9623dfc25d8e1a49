use crate::error::Result;
use crate::games::GameKind;
use crate::scoring::GameScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Recorded outcome of one completed session.
///
/// Fields are private so a result cannot be altered once built; every
/// constructor clamps score and accuracy into 0..=100 and duration to >= 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    game_type: GameKind,
    score: u32,
    duration_ms: f64,
    accuracy_pct: f64,
    difficulty_level: u32,
    completed_at: DateTime<Utc>,
}

impl GameResult {
    pub fn new(
        game_type: GameKind,
        score: u32,
        duration_ms: f64,
        accuracy_pct: f64,
        difficulty_level: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            game_type,
            score: score.min(100),
            duration_ms: if duration_ms.is_finite() {
                duration_ms.max(0.0)
            } else {
                0.0
            },
            accuracy_pct: if accuracy_pct.is_finite() {
                accuracy_pct.clamp(0.0, 100.0)
            } else {
                0.0
            },
            difficulty_level: difficulty_level.max(1),
            completed_at,
        }
    }

    pub fn from_score(
        game_type: GameKind,
        score: &GameScore,
        difficulty_level: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            game_type,
            score.score,
            score.duration_ms,
            score.accuracy_pct,
            difficulty_level,
            completed_at,
        )
    }

    pub fn game_type(&self) -> GameKind {
        self.game_type
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Score on a 0-1 scale.
    pub fn normalized_score(&self) -> f64 {
        self.score as f64 / 100.0
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn accuracy_pct(&self) -> f64 {
        self.accuracy_pct
    }

    pub fn difficulty_level(&self) -> u32 {
        self.difficulty_level
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Write `results` as CSV with a header row, one result per line.
pub fn write_csv<W: Write>(results: &[GameResult], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}
