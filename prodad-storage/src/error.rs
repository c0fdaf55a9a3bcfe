//! Error types for the storage layer.

use thiserror::Error;

/// All errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Records must be JSON objects so the assigned id can be merged in.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
