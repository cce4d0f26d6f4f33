//! Daemon-related errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// The queue could not report its length.
    #[error("Queue probe failed: {0}")]
    Probe(String),

    #[error("Invalid dashboard path: {0}")]
    InvalidPath(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
