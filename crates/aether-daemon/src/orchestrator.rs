//! Orchestrator heartbeat.
//!
//! Every tick evaluates the pause predicate, measures the queue and merges
//! `{"orchestrator": {status, queue_length, ts}}` into the dashboard.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use aether_config::GatesConfig;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dashboard::DashboardWriter;
use crate::error::DaemonError;
use crate::gates::should_pause;

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

pub const MIN_TICK: Duration = Duration::from_millis(250);
pub const MAX_TICK: Duration = Duration::from_millis(500);

/// Key the heartbeat owns in the dashboard document.
pub const DASHBOARD_KEY: &str = "orchestrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub status: RunState,
    pub queue_length: u64,
    pub ts: String,
}

/// Source of the published queue length.
#[async_trait]
pub trait QueueProbe: Send + Sync {
    async fn queue_length(&self) -> Result<u64, DaemonError>;
}

/// Called with each new status after the dashboard write.
pub type StatusObserver = Arc<dyn Fn(&OrchestratorStatus) + Send + Sync>;

pub fn clamp_tick(tick: Duration) -> Duration {
    tick.clamp(MIN_TICK, MAX_TICK)
}

pub struct Orchestrator {
    probe: Arc<dyn QueueProbe>,
    writer: DashboardWriter,
    gates: watch::Receiver<GatesConfig>,
    state: watch::Receiver<Value>,
    tick: Duration,
    observer: Option<StatusObserver>,
    latest: RwLock<Option<OrchestratorStatus>>,
    stop_tx: broadcast::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(
        probe: Arc<dyn QueueProbe>,
        writer: DashboardWriter,
        gates: watch::Receiver<GatesConfig>,
        state: watch::Receiver<Value>,
        tick: Duration,
    ) -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            probe,
            writer,
            gates,
            state,
            tick: clamp_tick(tick),
            observer: None,
            latest: RwLock::new(None),
            stop_tx,
            handle: Mutex::new(None),
        }
    }

    pub fn with_observer(mut self, observer: StatusObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick
    }

    /// Status published by the most recent successful tick.
    pub fn latest(&self) -> Option<OrchestratorStatus> {
        self.latest.read().ok().and_then(|guard| guard.clone())
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Current pause decision from gate flags and local state.
    pub fn is_paused(&self) -> bool {
        let gates = self.gates.borrow();
        let state = self.state.borrow();
        should_pause(&gates, &state)
    }

    /// One evaluation: decide, measure, write, notify.
    pub async fn tick(&self) -> Result<OrchestratorStatus, DaemonError> {
        let status = if self.is_paused() {
            RunState::Paused
        } else {
            RunState::Running
        };
        let queue_length = self.probe.queue_length().await?;
        let snapshot = OrchestratorStatus {
            status,
            queue_length,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        let writer = self.writer.clone();
        let value = serde_json::to_value(&snapshot)?;
        tokio::task::spawn_blocking(move || writer.merge(DASHBOARD_KEY, value))
            .await
            .map_err(|e| DaemonError::Io(std::io::Error::other(e)))??;

        if let Ok(mut guard) = self.latest.write() {
            *guard = Some(snapshot.clone());
        }

        if let Some(observer) = &self.observer {
            let notified = std::panic::catch_unwind(AssertUnwindSafe(|| observer(&snapshot)));
            if notified.is_err() {
                warn!("Orchestrator observer panicked");
            }
        }

        debug!(status = ?snapshot.status, queue_length, "Heartbeat");
        Ok(snapshot)
    }

    /// Spawn the heartbeat loop. A second call while running is a no-op.
    pub fn start(self: &Arc<Self>) {
        let Ok(mut guard) = self.handle.lock() else {
            return;
        };
        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let this = Arc::clone(self);
        let mut stop_rx = self.stop_tx.subscribe();
        *guard = Some(tokio::spawn(async move {
            info!(tick_ms = this.tick.as_millis() as u64, "Orchestrator started");
            loop {
                if let Err(e) = this.tick().await {
                    warn!(error = %e, "Heartbeat tick failed");
                }
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = tokio::time::sleep(this.tick) => {}
                }
            }
            info!("Orchestrator stopped");
        }));
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(());
        let handle = self.handle.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
