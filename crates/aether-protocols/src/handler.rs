//! Task handler protocol.
//!
//! A handler turns a task payload into a result document. Handlers never touch
//! the store; every side effect goes through an action adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::registry::Registerable;

/// Execution context passed to a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerContext {
    /// Id of the task being executed.
    pub task_id: String,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// Advisory execution budget in seconds.
    pub timeout_s: u64,
}

impl HandlerContext {
    pub fn new(task_id: impl Into<String>, attempt: u32, timeout_s: u64) -> Self {
        Self {
            task_id: task_id.into(),
            attempt,
            timeout_s,
        }
    }
}

/// Core trait for task handlers.
///
/// The handler is expected to honour `ctx.timeout_s` for any blocking work;
/// the runner does not impose an external timeout on the call.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The `task_type` key this handler serves (e.g. `files.write_text`).
    fn task_type(&self) -> &str;

    /// Execute the task payload.
    async fn handle(
        &self,
        payload: serde_json::Value,
        ctx: HandlerContext,
    ) -> Result<serde_json::Value, ActionError>;
}

impl Registerable for dyn TaskHandler {
    fn registry_id(&self) -> &str {
        self.task_type()
    }
}
