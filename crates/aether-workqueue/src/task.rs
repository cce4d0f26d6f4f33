//! Task definition and status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its first claim.
    Queued,
    /// Claimed and held by a worker.
    Running,
    Success,
    Failed,
    /// Waiting for `run_after` before the next attempt.
    RetryScheduled,
    /// Withdrawn by an administrator before it ran.
    Canceled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::RetryScheduled => "retry_scheduled",
            TaskStatus::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(TaskStatus::Queued),
            "running" => Some(TaskStatus::Running),
            "success" => Some(TaskStatus::Success),
            "failed" => Some(TaskStatus::Failed),
            "retry_scheduled" => Some(TaskStatus::RetryScheduled),
            "canceled" => Some(TaskStatus::Canceled),
            _ => None,
        }
    }

    /// Whether no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Failed | TaskStatus::Canceled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A durable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_type: String,
    pub payload: serde_json::Value,
    pub status: TaskStatus,
    /// Lower value is served first.
    pub priority: i64,
    pub attempt: u32,
    pub max_attempts: u32,
    /// Advisory budget handed to the handler.
    pub timeout_s: u64,
    pub run_after: DateTime<Utc>,
    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
    pub result: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether another attempt is allowed after a retryable failure.
    pub fn has_attempts_left(&self) -> bool {
        self.attempt < self.max_attempts
    }
}

/// Lightweight row returned by `list_recent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: String,
    pub task_type: String,
    pub status: TaskStatus,
    pub priority: i64,
    pub attempt: u32,
    pub max_attempts: u32,
    pub run_after: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub error: Option<serde_json::Value>,
}

/// Parameters of an enqueue call.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub id: String,
    pub task_type: String,
    pub payload: serde_json::Value,
    pub priority: i64,
    pub max_attempts: u32,
    pub timeout_s: u64,
    /// `None` means eligible immediately.
    pub run_after: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(
        id: impl Into<String>,
        task_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            task_type: task_type.into(),
            payload,
            priority: 50,
            max_attempts: 3,
            timeout_s: 60,
            run_after: None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout(mut self, timeout_s: u64) -> Self {
        self.timeout_s = timeout_s;
        self
    }

    pub fn with_run_after(mut self, run_after: DateTime<Utc>) -> Self {
        self.run_after = Some(run_after);
        self
    }
}
