//! Runtime error types.

use aether_daemon::DaemonError;
use aether_protocols::{ActionError, RegistryError};
use aether_workqueue::QueueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Action setup failed: {0}")]
    Action(#[from] ActionError),

    #[error("Daemon error: {0}")]
    Daemon(#[from] DaemonError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Runtime already started")]
    AlreadyStarted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
