use thiserror::Error;

/// Errors raised by result storage backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the write (used by stores that can go offline).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error type for the engine.
#[derive(Error, Debug)]
pub enum RecallError {
    /// The storage collaborator rejected a completed session's result.
    /// The result is kept by the recorder for a later retry.
    #[error("failed to record game result: {reason}")]
    Recorder { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RecallError>;
