//! Storage error types.

use thiserror::Error;

/// Errors from the agenda board store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid date key '{0}' (want YYYY-MM-DD)")]
    BadDateKey(String),

    #[error("Failed to prepare database path: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
