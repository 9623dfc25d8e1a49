use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::scheduler::Millis;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Timing and size constants for the three games.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub pair_count: usize,
    pub mismatch_reveal_ms: Millis,
    pub reaction_rounds: usize,
    pub reaction_min_delay_ms: Millis,
    pub reaction_max_delay_ms: Millis,
    pub sequence_max_level: u32,
    pub sequence_highlight_ms: Millis,
    pub sequence_pause_ms: Millis,
    pub sequence_level_pause_ms: Millis,
    pub sequence_nominal_duration_ms: Millis,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pair_count: 8,
            mismatch_reveal_ms: 1_000,
            reaction_rounds: 5,
            reaction_min_delay_ms: 1_000,
            reaction_max_delay_ms: 4_000,
            sequence_max_level: 5,
            sequence_highlight_ms: 600,
            sequence_pause_ms: 300,
            sequence_level_pause_ms: 1_500,
            sequence_nominal_duration_ms: 500,
        }
    }
}

/// Policy knobs for summaries and trend detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssessmentConfig {
    pub min_trend_points: usize,
    /// Minimum change in mean score (0-100 scale) that counts as a trend.
    pub trend_threshold: f64,
    /// Number of most recent results fetched for an assessment.
    pub history_limit: Option<usize>,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            min_trend_points: 4,
            trend_threshold: 5.0,
            history_limit: Some(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub games: GameConfig,
    pub assessment: AssessmentConfig,
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Database location: explicit setting first, then the platform default.
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .or_else(AppDirs::db_path)
            .unwrap_or_else(|| PathBuf::from("recall_results.db"))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("recall_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => {
                debug!(path = %self.path.display(), "no config file, using defaults");
                return Config::default();
            }
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
