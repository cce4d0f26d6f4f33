//! Action execution errors.

use thiserror::Error;

/// Failure raised by a side-effecting action or the handler wrapping it.
///
/// Only [`ActionError::Policy`] is terminal for a task. Every other variant is
/// a transient fault and the runner schedules a retry while attempts remain.
#[derive(Debug, Error)]
pub enum ActionError {
    /// An allowlist or sandbox boundary was violated.
    #[error("Policy violation: {0}")]
    Policy(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Action timed out after {0} seconds")]
    Timeout(u64),

    #[error("Action execution failed: {0}")]
    ExecutionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ActionError {
    /// Whether the runner may schedule another attempt after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ActionError::Policy(_))
    }

    /// Stable machine-readable kind, stored in the task error document.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::Policy(_) => "policy_error",
            ActionError::NotADirectory(_) => "not_a_directory",
            ActionError::InvalidPayload(_) => "invalid_payload",
            ActionError::Timeout(_) => "timeout",
            ActionError::ExecutionFailed(_) => "execution_error",
            ActionError::Io(_) => "io_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_is_not_retryable() {
        let err = ActionError::Policy("Path traversal blocked".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), "policy_error");
        assert!(err.to_string().contains("Path traversal blocked"));
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        let errors = vec![
            ActionError::NotADirectory("a.txt".to_string()),
            ActionError::InvalidPayload("missing path".to_string()),
            ActionError::Timeout(30),
            ActionError::ExecutionFailed("connection reset".to_string()),
            ActionError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")),
        ];

        for err in errors {
            assert!(err.is_retryable(), "{} should be retryable", err);
        }
    }

    #[test]
    fn test_timeout_display() {
        let err = ActionError::Timeout(5);
        assert!(err.to_string().contains("5 seconds"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = ActionError::from(io_err);
        assert_eq!(err.kind(), "io_error");
        assert!(err.to_string().contains("no such file"));
    }
}
