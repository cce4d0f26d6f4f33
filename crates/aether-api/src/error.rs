//! API error type and its JSON rendering.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use aether_runtime::RuntimeError;
use aether_workqueue::QueueError;

/// Every variant renders as `{"ok": false, "code": ..., "error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// HTTP 400.
    #[error("{0}")]
    BadRequest(String),

    /// HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            RuntimeError::Queue(QueueError::DuplicateId(id)) => {
                ApiError::Conflict(format!("Duplicate task id: {id}"))
            }
            RuntimeError::Queue(QueueError::TaskNotFound(id)) => {
                ApiError::NotFound(format!("Task not found: {id}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "API request failed");
        }
        let body = json!({
            "ok": false,
            "code": self.code(),
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_mapping() {
        let err: ApiError = RuntimeError::InvalidRequest("bad".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = RuntimeError::Queue(QueueError::DuplicateId("t".to_string())).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = RuntimeError::Queue(QueueError::Storage("disk".to_string())).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::NotFound("task-1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
