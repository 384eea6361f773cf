//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record encoding/decoding error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A record with the same key already exists in the object store.
    #[error("key already exists in object store {store}: {key:?}")]
    Constraint { store: String, key: String },

    /// Object store (or database) not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write attempted inside a read-only transaction.
    #[error("transaction on {0} is read-only")]
    ReadOnly(String),

    /// Record is not usable with the store's key path.
    #[error("invalid record: {0}")]
    Data(String),

    /// Requested version is older than the stored one.
    #[error("cannot open version {requested}: database is at version {current}")]
    Version { requested: u32, current: u32 },

    /// Version 0 is never valid.
    #[error("invalid database version: {0}")]
    InvalidVersion(u32),

    /// The upgrade callback rejected the version change.
    #[error("upgrade aborted: {0}")]
    Upgrade(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Provider cannot serve databases in this environment.
    #[error("provider {0} is unavailable")]
    Unavailable(String),

    /// Background task or lock failure.
    #[error("task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Map a poisoned lock into a store error.
pub(crate) fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Task(format!("lock poisoned: {}", e))
}
