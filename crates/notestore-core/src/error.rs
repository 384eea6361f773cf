//! Error types for notestore core.

use thiserror::Error;

/// Rejections that happen before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid item title")]
    EmptyTitle,

    #[error("saving ongoing")]
    SaveInProgress,

    #[error("malformed note record: {0}")]
    MalformedRecord(String),
}
