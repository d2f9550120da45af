//! Storage layer error types.

use shared::BackendKind;
use thiserror::Error;

/// Failures raised by a single storage backend
///
/// These never reach facade callers: the composite store logs them and
/// degrades to an empty read or a `false` write.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{0} backend is unavailable: {1}")]
    Unavailable(BackendKind, String),

    #[error("{0} backend failed its probe: {1}")]
    Probe(BackendKind, String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
