//! Error types for the note store adapter.

use notestore_core::ValidationError;
use notestore_store::StoreError;
use thiserror::Error;

/// Errors that can occur during note store operations.
///
/// Every failure is local to the call that produced it; nothing is retried.
#[derive(Debug, Error)]
pub enum NoteStoreError {
    /// No provider can serve databases in this environment.
    #[error("database provider not available")]
    Unavailable,

    /// The database failed to open, or its upgrade failed.
    #[error("error loading database: {0}")]
    Open(#[source] StoreError),

    /// Rejected before touching the store.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A store transaction or cursor step failed.
    #[error("transaction error: {0}")]
    Transaction(#[source] StoreError),

    /// `setup` has not completed yet.
    #[error("database not initialised; call setup first")]
    NotInitialized,
}

impl NoteStoreError {
    /// Whether the underlying store rejected a duplicate key.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, NoteStoreError::Transaction(StoreError::Constraint { .. }))
    }
}

/// Result type for note store operations.
pub type Result<T> = std::result::Result<T, NoteStoreError>;
