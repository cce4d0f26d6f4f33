//! Command routing errors.

use thiserror::Error;

/// Errors a chat-style command can produce.
///
/// The router turns every variant into an error outcome; none of them are
/// allowed to escape to the caller as a panic.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Command failed: {0}")]
    Failed(String),
}
