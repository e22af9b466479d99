//! Error types for gs-store.

use thiserror::Error;

/// Errors raised by a [`PositionStore`][crate::PositionStore] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row with the same (latitude, longitude) pair already exists.
    /// Non-fatal: callers may ignore or report it.
    #[error("position ({latitude}, {longitude}) already exists")]
    Conflict { latitude: f64, longitude: f64 },

    /// No row with this id.  Non-fatal.
    #[error("position {0} not found")]
    NotFound(i64),

    /// A bulk call with nothing in it is a caller bug, not a no-op.
    #[error("bulk insert batch is empty")]
    EmptyBatch,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("timestamp encode error: {0}")]
    TimeFormat(#[from] time::error::Format),

    #[cfg(feature = "http")]
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;
