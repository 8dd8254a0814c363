//! Error types for scheduling, collection management and persistence.

use thiserror::Error;

/// Broad classification of a [`SchedulerError`], for callers that map
/// failures onto responses (e.g. HTTP status codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InvalidState,
}

/// Errors returned by the scheduling engine and the collection.
///
/// A failed call never leaves partial changes behind.
#[derive(Debug, Error, PartialEq)]
pub enum SchedulerError {
    #[error("card not found: {0}")]
    CardNotFound(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The session has already been ended and accepts no further changes.
    #[error("session already closed: {0}")]
    SessionClosed(String),

    #[error("card id already exists: {0}")]
    DuplicateId(String),

    #[error("quality must be between 0 and 5, got {0}")]
    InvalidQuality(u8),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl SchedulerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::CardNotFound(_) | SchedulerError::SessionNotFound(_) => {
                ErrorKind::NotFound
            }
            SchedulerError::DuplicateId(_)
            | SchedulerError::InvalidQuality(_)
            | SchedulerError::InvalidSnapshot(_) => ErrorKind::InvalidInput,
            SchedulerError::SessionClosed(_) => ErrorKind::InvalidState,
        }
    }
}

/// Errors raised while reading or writing snapshots.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
