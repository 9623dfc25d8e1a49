use crate::error::StoreError;
use crate::games::GameKind;
use crate::result::GameResult;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Which results to fetch. `since` drops results completed before it;
/// `limit` then keeps the most recent matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub game_type: Option<GameKind>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn game(game_type: GameKind) -> Self {
        Self {
            game_type: Some(game_type),
            ..Self::default()
        }
    }

    pub fn with_since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Append-only result storage.
///
/// `fetch_result_history` returns an owned snapshot in chronological order
/// (oldest first), so callers can aggregate while new results are recorded.
pub trait ResultStore: Send + Sync {
    fn record_game_result(&self, result: &GameResult) -> StoreResult<()>;
    fn fetch_result_history(&self, filter: &HistoryFilter) -> StoreResult<Vec<GameResult>>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: RwLock<Vec<GameResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryResultStore {
    fn record_game_result(&self, result: &GameResult) -> StoreResult<()> {
        self.results.write().push(result.clone());
        Ok(())
    }

    fn fetch_result_history(&self, filter: &HistoryFilter) -> StoreResult<Vec<GameResult>> {
        let mut matching: Vec<GameResult> = self
            .results
            .read()
            .iter()
            .filter(|r| filter.game_type.map_or(true, |k| r.game_type() == k))
            .filter(|r| filter.since.map_or(true, |t| r.completed_at() >= t))
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.completed_at());

        if let Some(limit) = filter.limit {
            let skip = matching.len().saturating_sub(limit);
            matching.drain(..skip);
        }
        Ok(matching)
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS game_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        game_type TEXT NOT NULL,
        score INTEGER NOT NULL,
        duration_ms REAL NOT NULL,
        accuracy_pct REAL NOT NULL,
        difficulty_level INTEGER NOT NULL,
        completed_at TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_game_results_type ON game_results(game_type);
    CREATE INDEX IF NOT EXISTS idx_game_results_completed ON game_results(completed_at);
"#;

/// SQLite-backed store.
#[derive(Debug)]
pub struct SqliteResultStore {
    conn: Mutex<Connection>,
}

impl SqliteResultStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening result store");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored results.
    pub fn count(&self) -> StoreResult<usize> {
        let n: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM game_results", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Remove every stored result.
    pub fn clear_all(&self) -> StoreResult<()> {
        self.conn.lock().execute("DELETE FROM game_results", [])?;
        Ok(())
    }
}

/// Raw row before validation.
struct ResultRow {
    game_type: String,
    score: i64,
    duration_ms: f64,
    accuracy_pct: f64,
    difficulty_level: i64,
    completed_at: String,
}

impl TryFrom<ResultRow> for GameResult {
    type Error = StoreError;

    fn try_from(row: ResultRow) -> StoreResult<Self> {
        let game_type = row.game_type.parse::<GameKind>().map_err(StoreError::InvalidData)?;
        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| StoreError::InvalidData(format!("completed_at: {e}")))?
            .with_timezone(&Utc);

        Ok(GameResult::new(
            game_type,
            row.score.clamp(0, 100) as u32,
            row.duration_ms,
            row.accuracy_pct,
            row.difficulty_level.max(1) as u32,
            completed_at,
        ))
    }
}

impl ResultStore for SqliteResultStore {
    fn record_game_result(&self, result: &GameResult) -> StoreResult<()> {
        self.conn.lock().execute(
            r#"
            INSERT INTO game_results
            (game_type, score, duration_ms, accuracy_pct, difficulty_level, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                result.game_type().as_str(),
                result.score(),
                result.duration_ms(),
                result.accuracy_pct(),
                result.difficulty_level(),
                timestamp(result.completed_at()),
            ],
        )?;
        debug!(game = %result.game_type(), "stored game result");
        Ok(())
    }

    fn fetch_result_history(&self, filter: &HistoryFilter) -> StoreResult<Vec<GameResult>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT game_type, score, duration_ms, accuracy_pct, difficulty_level, completed_at
            FROM game_results
            WHERE (?1 IS NULL OR game_type = ?1)
              AND (?2 IS NULL OR completed_at >= ?2)
            ORDER BY completed_at DESC, id DESC
            LIMIT ?3
            "#,
        )?;

        let game_type = filter.game_type.map(|k| k.as_str());
        let since = filter.since.map(timestamp);
        let limit = filter.limit.map_or(-1, |l| l as i64);
        let rows = stmt.query_map(params![game_type, since, limit], |row| {
            Ok(ResultRow {
                game_type: row.get(0)?,
                score: row.get(1)?,
                duration_ms: row.get(2)?,
                accuracy_pct: row.get(3)?,
                difficulty_level: row.get(4)?,
                completed_at: row.get(5)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(GameResult::try_from(row?)?);
        }
        results.reverse();
        Ok(results)
    }
}
