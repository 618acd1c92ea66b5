//! Storage Layer
//!
//! Receives periodic and final session checkpoints from the host and keeps
//! them behind the [`SummarySink`] seam. The in-memory repository doubles as
//! an export point (JSON for people, postcard for compact archives).

mod repository;

pub use repository::{CheckpointKind, SummaryRecord, SummaryRepository, SummarySink};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Repository lock poisoned")]
    LockPoisoned,
    #[error("Record not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

impl From<postcard::Error> for StorageError {
    fn from(e: postcard::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}
