//! Error types for wq-output.

use thiserror::Error;
use wq_sim::SimError;

/// Errors that can occur while segmenting pipes or writing output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("segment length must be positive and finite, got {0} m")]
    InvalidSegmentLength(f64),

    #[error("query failed: {0}")]
    Sim(#[from] SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
