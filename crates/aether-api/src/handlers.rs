//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use aether_runtime::EnqueueRequest;

use crate::error::ApiError;
use crate::state::AppState;

const STATUS_RECENT: usize = 10;

/// Body of `POST /api/enqueue`. Defaults differ from the config-level ones.
#[derive(Debug, Deserialize)]
pub struct EnqueueBody {
    pub task_type: String,
    pub payload: Value,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_priority() -> i64 {
    20
}

fn default_timeout_s() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

#[derive(Debug, Deserialize)]
pub struct CommandBody {
    pub command: String,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.increment_requests();
    Json(json!({ "ok": true }))
}

/// GET /api/status
pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    state.increment_requests();
    let recent = state.runtime.list_recent(STATUS_RECENT).await?;
    Ok(Json(json!({
        "ok": true,
        "recent": recent,
        "orchestrator": state.runtime.orchestrator_status(),
        "requests": state.request_count(),
    })))
}

/// POST /api/enqueue
pub async fn enqueue(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EnqueueBody>,
) -> Result<Json<Value>, ApiError> {
    state.increment_requests();
    let request = EnqueueRequest::new(body.task_type, body.payload)
        .with_priority(body.priority)
        .with_timeout(body.timeout_s)
        .with_max_attempts(body.max_attempts);
    let task_id = state.runtime.enqueue(request).await?;
    info!(task_id = %task_id, "Task enqueued via API");
    Ok(Json(json!({ "ok": true, "task_id": task_id })))
}

/// GET /api/task/{id}
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.increment_requests();
    let task = state
        .runtime
        .get_task(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {id}")))?;
    Ok(Json(json!({ "ok": true, "task": task })))
}

/// POST /api/task/{id}/cancel
pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.increment_requests();
    if !state.runtime.cancel_task(&id).await? {
        return Err(ApiError::Conflict(format!(
            "Task {id} is not waiting to run"
        )));
    }
    info!(task_id = %id, "Task canceled via API");
    Ok(Json(json!({ "ok": true, "task_id": id })))
}

/// POST /api/command
pub async fn command(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CommandBody>,
) -> Result<Json<Value>, ApiError> {
    state.increment_requests();
    let outcome = state
        .runtime
        .route_command(&body.command)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No command handles: {}", body.command.trim())))?;
    Ok(Json(serde_json::to_value(outcome).map_err(|e| ApiError::Internal(e.to_string()))?))
}
