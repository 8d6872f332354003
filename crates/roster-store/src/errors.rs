//! Store error type and `Result` alias.

use thiserror::Error;

/// Errors surfaced by the identity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool failure (checkout timeout included).
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Invariant violation inside the store itself.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
