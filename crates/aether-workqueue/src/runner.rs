//! Task runner: claim, dispatch, resolve.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use aether_protocols::{ActionError, HandlerContext};
use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backoff::backoff_delay;
use crate::config::RunnerConfig;
use crate::error::QueueError;
use crate::registry::HandlerRegistry;
use crate::store::SqliteTaskStore;
use crate::task::Task;

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

/// What a single `run_once` did.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Nothing was claimable.
    Idle,
    Succeeded(String),
    /// Rescheduled after a retryable fault.
    Retried(String),
    Failed(String),
    /// The lock was lost before dispatch; nothing ran.
    Abandoned(String),
}

fn error_doc(kind: &str, message: impl std::fmt::Display) -> serde_json::Value {
    json!({ "type": kind, "message": message.to_string() })
}

/// A single logical worker polling the store.
///
/// Any number of runners may share one store; the claim is the only
/// mutual-exclusion point between them.
pub struct TaskRunner {
    worker_id: String,
    store: Arc<SqliteTaskStore>,
    handlers: Arc<HandlerRegistry>,
    config: RunnerConfig,
    tasks_succeeded: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_retried: AtomicU64,
}

impl TaskRunner {
    pub fn new(
        store: Arc<SqliteTaskStore>,
        handlers: Arc<HandlerRegistry>,
        config: RunnerConfig,
    ) -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        let worker_id = format!("{}-{}", config.worker_prefix, &simple[..8]);
        Self {
            worker_id,
            store,
            handlers,
            config,
            tasks_succeeded: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_retried: AtomicU64::new(0),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn tasks_succeeded(&self) -> u64 {
        self.tasks_succeeded.load(Ordering::SeqCst)
    }

    pub fn tasks_failed(&self) -> u64 {
        self.tasks_failed.load(Ordering::SeqCst)
    }

    pub fn tasks_retried(&self) -> u64 {
        self.tasks_retried.load(Ordering::SeqCst)
    }

    /// Claim and process at most one task.
    ///
    /// On an empty poll, stale locks are reclaimed when enabled.
    pub async fn run_once(&self) -> Result<RunOutcome, QueueError> {
        match self.store.claim_next(&self.worker_id).await? {
            Some(task) => self.process(task).await,
            None => {
                if self.config.stale_lock_factor > 0 {
                    self.store
                        .reclaim_stale(
                            Utc::now(),
                            self.config.stale_lock_factor,
                            self.config.stale_lock_min_secs,
                        )
                        .await?;
                }
                Ok(RunOutcome::Idle)
            }
        }
    }

    /// Dispatch a task this runner has already claimed.
    pub async fn process(&self, mut task: Task) -> Result<RunOutcome, QueueError> {
        let Some(attempt) = self
            .store
            .increment_attempt(&task.id, &self.worker_id)
            .await?
        else {
            warn!(task_id = %task.id, worker = %self.worker_id, "Lock lost before dispatch");
            return Ok(RunOutcome::Abandoned(task.id));
        };
        task.attempt = attempt;

        let Some(handler) = self.handlers.get(&task.task_type) else {
            error!(task_id = %task.id, task_type = %task.task_type, "No handler registered");
            let err = QueueError::UnknownTaskType(task.task_type.clone());
            self.store
                .mark_failed(&task.id, &self.worker_id, error_doc("unknown_task_type", err))
                .await?;
            self.tasks_failed.fetch_add(1, Ordering::SeqCst);
            return Ok(RunOutcome::Failed(task.id));
        };

        debug!(
            task_id = %task.id,
            task_type = %task.task_type,
            attempt,
            worker = %self.worker_id,
            "Dispatching task"
        );

        let ctx = HandlerContext::new(task.id.clone(), attempt, task.timeout_s);
        let payload = task.payload.clone();
        // Run on its own task so a panicking handler cannot take the loop down.
        let handle = tokio::spawn(async move { handler.handle(payload, ctx).await });
        let joined = self.await_with_lock_refresh(&task.id, handle).await;
        let outcome = match joined {
            Ok(result) => result,
            Err(join_err) => Err(ActionError::ExecutionFailed(format!(
                "handler panicked: {}",
                join_err
            ))),
        };

        match outcome {
            Ok(result) => {
                self.store
                    .mark_success(&task.id, &self.worker_id, result)
                    .await?;
                self.tasks_succeeded.fetch_add(1, Ordering::SeqCst);
                debug!(task_id = %task.id, "Task succeeded");
                Ok(RunOutcome::Succeeded(task.id))
            }
            Err(err) if !err.is_retryable() => {
                warn!(task_id = %task.id, error = %err, "Task rejected by policy");
                self.store
                    .mark_failed(&task.id, &self.worker_id, error_doc("policy_error", &err))
                    .await?;
                self.tasks_failed.fetch_add(1, Ordering::SeqCst);
                Ok(RunOutcome::Failed(task.id))
            }
            Err(err) => {
                let mut doc = error_doc("exception", &err);
                doc["kind"] = json!(err.kind());

                if !task.has_attempts_left() {
                    error!(
                        task_id = %task.id,
                        attempt,
                        max_attempts = task.max_attempts,
                        error = %err,
                        "Task failed, attempts exhausted"
                    );
                    self.store
                        .mark_failed(&task.id, &self.worker_id, doc)
                        .await?;
                    self.tasks_failed.fetch_add(1, Ordering::SeqCst);
                    Ok(RunOutcome::Failed(task.id))
                } else {
                    let delay = backoff_delay(attempt);
                    let next = Utc::now()
                        + chrono::Duration::from_std(delay)
                            .unwrap_or_else(|_| chrono::Duration::seconds(300));
                    warn!(
                        task_id = %task.id,
                        attempt,
                        delay_s = delay.as_secs(),
                        error = %err,
                        "Task failed, retry scheduled"
                    );
                    self.store
                        .schedule_retry(&task.id, &self.worker_id, next, doc)
                        .await?;
                    self.tasks_retried.fetch_add(1, Ordering::SeqCst);
                    Ok(RunOutcome::Retried(task.id))
                }
            }
        }
    }

    /// Wait for a dispatched handler, refreshing the task lock meanwhile so
    /// idle runners do not reclaim it as stale.
    async fn await_with_lock_refresh<T>(
        &self,
        task_id: &str,
        mut handle: JoinHandle<T>,
    ) -> Result<T, JoinError> {
        let mut refresh = tokio::time::interval(self.config.lock_refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the claim just set the lock.
        refresh.tick().await;

        loop {
            tokio::select! {
                joined = &mut handle => return joined,
                _ = refresh.tick() => {
                    match self.store.touch(task_id, &self.worker_id).await {
                        Ok(true) => debug!(task_id = %task_id, "Lock refreshed"),
                        Ok(false) => warn!(task_id = %task_id, worker = %self.worker_id, "Lock lost while handler running"),
                        Err(e) => warn!(task_id = %task_id, error = %e, "Lock refresh failed"),
                    }
                }
            }
        }
    }

    /// Poll until a shutdown signal arrives.
    ///
    /// The signal is observed between tasks and while idle; a task already
    /// dispatched runs to completion.
    pub async fn run(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(worker = %self.worker_id, "Task runner started");

        loop {
            match shutdown_rx.try_recv() {
                Err(TryRecvError::Empty) => {}
                _ => break,
            }

            let idle = match self.run_once().await {
                Ok(RunOutcome::Idle) => true,
                Ok(_) => false,
                Err(e) => {
                    // Typically a busy database; retried on the next poll.
                    warn!(worker = %self.worker_id, error = %e, "Poll failed");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
            }
        }

        info!(
            worker = %self.worker_id,
            succeeded = self.tasks_succeeded(),
            failed = self.tasks_failed(),
            retried = self.tasks_retried(),
            "Task runner stopped"
        );
    }
}
