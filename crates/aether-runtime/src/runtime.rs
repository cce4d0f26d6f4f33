//! The Aether service object.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use aether_config::{Config, GatesConfig};
use aether_daemon::{
    DashboardWriter, Orchestrator, OrchestratorStatus, SignalHandler, StatusObserver, load_state,
};
use aether_protocols::CommandOutcome;
use aether_workqueue::{
    HandlerRegistry, RunnerConfig, SqliteTaskStore, Task, TaskRunner, TaskSummary,
};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands;
use crate::error::RuntimeError;
use crate::register::register_builtin_handlers;
use crate::router::CommandRouter;
use crate::services::{EnqueueRequest, Services, StoreProbe};

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;

struct Worker {
    runner: Arc<TaskRunner>,
    handle: JoinHandle<()>,
}

/// Owns every long-lived component. Build once, pass by `Arc`.
pub struct AetherRuntime {
    services: Arc<Services>,
    router: CommandRouter,
    gates_tx: watch::Sender<GatesConfig>,
    state_tx: watch::Sender<Value>,
    signal: SignalHandler,
    workers: Mutex<Vec<Worker>>,
}

impl AetherRuntime {
    pub async fn new(config: Config) -> Result<Self, RuntimeError> {
        Self::build(config, None).await
    }

    /// Build with a callback invoked on every heartbeat.
    pub async fn with_observer(
        config: Config,
        observer: StatusObserver,
    ) -> Result<Self, RuntimeError> {
        Self::build(config, Some(observer)).await
    }

    async fn build(config: Config, observer: Option<StatusObserver>) -> Result<Self, RuntimeError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let store = Arc::new(SqliteTaskStore::open(config.db_path()).await?);

        let handlers = Arc::new(HandlerRegistry::new());
        let sandbox = register_builtin_handlers(&handlers, &config)?;

        let (gates_tx, gates_rx) = watch::channel(config.gates.clone());
        let (state_tx, state_rx) = watch::channel(load_state(&config.state_path()));

        let writer = DashboardWriter::new(config.dashboard_path(), &config.data_dir);
        let mut orchestrator = Orchestrator::new(
            Arc::new(StoreProbe(store.clone())),
            writer,
            gates_rx.clone(),
            state_rx,
            Duration::from_millis(config.orchestrator.tick_ms),
        );
        if let Some(observer) = observer {
            orchestrator = orchestrator.with_observer(observer);
        }

        let services = Arc::new(Services::new(
            config,
            store,
            handlers,
            sandbox,
            Arc::new(orchestrator),
            gates_rx,
        ));
        let router = commands::builtin_router(services.clone())?;

        info!(
            data_dir = %services.config.data_dir.display(),
            task_types = services.handlers.len(),
            commands = router.len(),
            "Runtime initialized"
        );

        Ok(Self {
            services,
            router,
            gates_tx,
            state_tx,
            signal: SignalHandler::new(),
            workers: Mutex::new(Vec::new()),
        })
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn config(&self) -> &Config {
        &self.services.config
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub fn signal(&self) -> &SignalHandler {
        &self.signal
    }

    pub fn is_started(&self) -> bool {
        self.workers.lock().map(|w| !w.is_empty()).unwrap_or(false)
    }

    /// Spawn the runner pool and, when enabled, the heartbeat.
    pub fn start(&self) -> Result<(), RuntimeError> {
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        if !workers.is_empty() {
            return Err(RuntimeError::AlreadyStarted);
        }

        let config = &self.services.config;
        let runner_config = RunnerConfig::from(&config.runner);
        for _ in 0..config.runner.workers.max(1) {
            let runner = Arc::new(TaskRunner::new(
                self.services.store.clone(),
                self.services.handlers.clone(),
                runner_config.clone(),
            ));
            let handle = tokio::spawn(runner.clone().run(self.signal.subscribe()));
            workers.push(Worker { runner, handle });
        }

        if config.orchestrator.enabled {
            self.services.orchestrator.start();
        }

        info!(workers = workers.len(), "Runtime started");
        Ok(())
    }

    /// Stop runners and heartbeat; in-flight tasks finish first.
    pub async fn shutdown(&self) {
        self.signal.request_shutdown();
        self.services.orchestrator.stop().await;

        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(|e| e.into_inner()));
        for worker in workers {
            let id = worker.runner.worker_id().to_string();
            if let Err(e) = worker.handle.await {
                warn!(worker = %id, error = %e, "Runner exited abnormally");
            } else {
                debug!(worker = %id, "Runner joined");
            }
        }
        info!("Runtime stopped");
    }

    /// Identifiers of the running workers.
    pub fn worker_ids(&self) -> Vec<String> {
        self.workers
            .lock()
            .map(|w| w.iter().map(|w| w.runner.worker_id().to_string()).collect())
            .unwrap_or_default()
    }

    pub async fn enqueue(&self, request: EnqueueRequest) -> Result<String, RuntimeError> {
        self.services.enqueue(request).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>, RuntimeError> {
        self.services.get_task(id).await
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<TaskSummary>, RuntimeError> {
        self.services.list_recent(limit).await
    }

    pub async fn cancel_task(&self, id: &str) -> Result<bool, RuntimeError> {
        self.services.cancel_task(id).await
    }

    /// Replace the gate flags seen by the heartbeat.
    pub fn set_gates(&self, gates: GatesConfig) {
        info!(
            safe_mode = gates.safe_mode,
            freeze = gates.freeze,
            kill_switch = ?gates.kill_switch,
            "Gate flags updated"
        );
        self.gates_tx.send_replace(gates);
    }

    /// Replace the local state snapshot seen by the heartbeat.
    pub fn set_state(&self, state: Value) {
        self.state_tx.send_replace(state);
    }

    pub fn orchestrator_status(&self) -> Option<OrchestratorStatus> {
        self.services.orchestrator_status()
    }

    pub async fn route_command(&self, input: &str) -> Option<CommandOutcome> {
        self.router.route(input).await
    }
}
