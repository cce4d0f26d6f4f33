//! # Aether Daemon
//!
//! Process-level plumbing around the task queue:
//!
//! - [`orchestrator::Orchestrator`]: heartbeat loop publishing a RUNNING/PAUSED status
//! - [`gates`]: the pause predicate over gate flags and the local state snapshot
//! - [`dashboard::DashboardWriter`]: atomic read-merge-write of the status document
//! - [`signal::SignalHandler`]: OS signals to a shutdown broadcast

pub mod dashboard;
pub mod error;
pub mod gates;
pub mod orchestrator;
pub mod signal;

pub use dashboard::DashboardWriter;
pub use error::DaemonError;
pub use gates::{load_state, should_pause};
pub use orchestrator::{Orchestrator, OrchestratorStatus, QueueProbe, RunState, StatusObserver};
pub use signal::SignalHandler;
