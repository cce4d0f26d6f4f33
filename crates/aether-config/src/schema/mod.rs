//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod schema_actions;

pub use schema_actions::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of everything the process writes: task database, sandbox,
    /// dashboard and logs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub enqueue: EnqueueDefaults,

    #[serde(default)]
    pub actions: ActionsConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub gates: GatesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
            runner: RunnerSection::default(),
            enqueue: EnqueueDefaults::default(),
            actions: ActionsConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            gates: GatesConfig::default(),
        }
    }
}

impl Config {
    /// SQLite file holding the task table.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("aether_tasks.db")
    }

    /// Sandbox base for file and shell actions.
    pub fn work_dir(&self) -> PathBuf {
        self.actions
            .work_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("workspace"))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.orchestrator
            .dashboard_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("aether_dashboard.json"))
    }

    pub fn state_path(&self) -> PathBuf {
        self.orchestrator
            .state_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("aether_state.json"))
    }

    /// Structured log consumed by `console logs`.
    pub fn event_log_path(&self) -> PathBuf {
        self.data_dir.join("aether_log.json")
    }

    /// Whether `path` lives under the data directory.
    pub fn is_under_data_dir(&self, path: &Path) -> bool {
        path.starts_with(&self.data_dir)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/tmp/aether")
}

/// HTTP API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enabled: true,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Task runner pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSection {
    /// Number of independent runner loops sharing the store.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Sleep between empty polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_worker_prefix")]
    pub worker_prefix: String,

    /// A running row is reclaimed once its lock is older than
    /// `timeout_s * stale_lock_factor` seconds. Zero disables reclaiming.
    #[serde(default = "default_stale_lock_factor")]
    pub stale_lock_factor: u32,

    /// Lower bound of the reclaim age in seconds.
    #[serde(default = "default_stale_lock_min_secs")]
    pub stale_lock_min_secs: u64,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            worker_prefix: default_worker_prefix(),
            stale_lock_factor: default_stale_lock_factor(),
            stale_lock_min_secs: default_stale_lock_min_secs(),
        }
    }
}

fn default_workers() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_worker_prefix() -> String {
    "worker".to_string()
}

fn default_stale_lock_factor() -> u32 {
    3
}

fn default_stale_lock_min_secs() -> u64 {
    60
}

/// Defaults applied to tasks enqueued without explicit values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueDefaults {
    #[serde(default = "default_priority")]
    pub priority: i64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,
}

impl Default for EnqueueDefaults {
    fn default() -> Self {
        Self {
            priority: default_priority(),
            max_attempts: default_max_attempts(),
            timeout_s: default_timeout_s(),
        }
    }
}

fn default_priority() -> i64 {
    50
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_s() -> u64 {
    60
}

/// Orchestrator heartbeat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tick interval; clamped to 250..=500 ms at runtime.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_path: Option<PathBuf>,

    /// Locally held state snapshot (safe mode, freeze, pause).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_ms: default_tick_ms(),
            dashboard_path: None,
            state_path: None,
        }
    }
}

fn default_tick_ms() -> u64 {
    300
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
