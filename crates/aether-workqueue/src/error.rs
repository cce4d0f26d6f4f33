//! Queue errors.

use aether_protocols::RegistryError;
use thiserror::Error;

/// Queue error types.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A task with this id already exists.
    #[error("Duplicate task id: {0}")]
    DuplicateId(String),

    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// No handler is registered for the task type.
    #[error("Unknown task type: {0}")]
    UnknownTaskType(String),

    /// The durable store failed; the operation had no effect.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<tokio_rusqlite::Error> for QueueError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        QueueError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for QueueError {
    fn from(err: rusqlite::Error) -> Self {
        QueueError::Storage(err.to_string())
    }
}
