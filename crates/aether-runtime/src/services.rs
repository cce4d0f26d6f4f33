//! Shared services handed to commands and interfaces.

use std::sync::Arc;
use std::time::Instant;

use aether_actions_files::Sandbox;
use aether_config::{Config, GatesConfig};
use aether_daemon::{DaemonError, Orchestrator, OrchestratorStatus, QueueProbe};
use aether_workqueue::{
    HandlerRegistry, NewTask, QueueError, SqliteTaskStore, Task, TaskSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::error::RuntimeError;

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;

/// Producer-side enqueue call. Unset fields take the `[enqueue]` defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRequest {
    pub task_type: String,
    #[serde(default = "empty_object")]
    pub payload: Value,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub timeout_s: Option<u64>,
    #[serde(default)]
    pub run_after: Option<DateTime<Utc>>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl EnqueueRequest {
    pub fn new(task_type: impl Into<String>, payload: Value) -> Self {
        Self {
            task_type: task_type.into(),
            payload,
            priority: None,
            max_attempts: None,
            timeout_s: None,
            run_after: None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout_s: u64) -> Self {
        self.timeout_s = Some(timeout_s);
        self
    }
}

/// Store-backed queue length for the heartbeat.
pub struct StoreProbe(pub Arc<SqliteTaskStore>);

#[async_trait]
impl QueueProbe for StoreProbe {
    async fn queue_length(&self) -> Result<u64, DaemonError> {
        self.0
            .count_pending()
            .await
            .map_err(|e| DaemonError::Probe(e.to_string()))
    }
}

/// Everything a command needs, without the lifecycle plumbing.
pub struct Services {
    pub config: Config,
    pub store: Arc<SqliteTaskStore>,
    pub handlers: Arc<HandlerRegistry>,
    pub sandbox: Arc<Sandbox>,
    pub orchestrator: Arc<Orchestrator>,
    gates: watch::Receiver<GatesConfig>,
    started_at: Instant,
}

impl Services {
    pub fn new(
        config: Config,
        store: Arc<SqliteTaskStore>,
        handlers: Arc<HandlerRegistry>,
        sandbox: Arc<Sandbox>,
        orchestrator: Arc<Orchestrator>,
        gates: watch::Receiver<GatesConfig>,
    ) -> Self {
        Self {
            config,
            store,
            handlers,
            sandbox,
            orchestrator,
            gates,
            started_at: Instant::now(),
        }
    }

    /// Enqueue with id `task-<uuid hex>`.
    pub async fn enqueue(&self, request: EnqueueRequest) -> Result<String, RuntimeError> {
        if request.task_type.trim().is_empty() {
            return Err(RuntimeError::InvalidRequest("task_type is empty".to_string()));
        }
        if !request.payload.is_object() {
            return Err(RuntimeError::InvalidRequest(
                "payload must be a JSON object".to_string(),
            ));
        }
        if request.max_attempts == Some(0) {
            return Err(RuntimeError::InvalidRequest(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let defaults = &self.config.enqueue;
        let id = format!("task-{}", Uuid::new_v4().simple());
        let mut task = NewTask::new(id, request.task_type, request.payload)
            .with_priority(request.priority.unwrap_or(defaults.priority))
            .with_max_attempts(request.max_attempts.unwrap_or(defaults.max_attempts))
            .with_timeout(request.timeout_s.unwrap_or(defaults.timeout_s));
        if let Some(run_after) = request.run_after {
            task = task.with_run_after(run_after);
        }

        let task_type = task.task_type.clone();
        let id = self.store.enqueue(task).await?;
        info!(task_id = %id, task_type = %task_type, "Task enqueued");
        Ok(id)
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>, RuntimeError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<TaskSummary>, RuntimeError> {
        Ok(self.store.list_recent(limit).await?)
    }

    /// `Ok(false)` when the task exists but is no longer waiting to run.
    pub async fn cancel_task(&self, id: &str) -> Result<bool, RuntimeError> {
        let canceled = self.store.cancel(id).await?;
        if canceled {
            info!(task_id = %id, "Task canceled");
        } else if self.store.get(id).await?.is_none() {
            return Err(QueueError::TaskNotFound(id.to_string()).into());
        }
        Ok(canceled)
    }

    pub fn gates(&self) -> GatesConfig {
        self.gates.borrow().clone()
    }

    pub fn orchestrator_status(&self) -> Option<OrchestratorStatus> {
        self.orchestrator.latest()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Snapshot used by `status` and the API.
    pub async fn status_report(&self, recent: usize) -> Result<Value, RuntimeError> {
        let pending = self.store.count_pending().await?;
        let recent = self.store.list_recent(recent).await?;
        let mut task_types = self.handlers.task_types();
        task_types.sort();

        Ok(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_secs": self.uptime_secs(),
            "data_dir": self.config.data_dir,
            "workers": self.config.runner.workers,
            "task_types": task_types,
            "pending": pending,
            "paused": self.orchestrator.is_paused(),
            "orchestrator": self.orchestrator_status(),
            "recent": recent,
        }))
    }
}
