//! Storage-specific error types.
//!
//! All storage operations return [`StorageError`] on failure. Details are
//! logged at the call site; the HTTP layer maps every variant to a generic
//! server error so internals never leak to clients.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error (e.g., task join failure).
    #[error("internal error: {0}")]
    Internal(String),
}
