//! # Aether Workqueue
//!
//! Durable single-node task queue.
//!
//! ## Features
//!
//! - SQLite task store with an atomic claim-next primitive
//! - Lower-first priority with creation-order tie break
//! - Scheduled retries with a bounded backoff schedule
//! - Lock-guarded resolution (duplicate resolution is a no-op)
//! - Stale lock reclaiming for rows orphaned by a crashed worker
//! - Polling task runner dispatching to registered handlers

pub mod backoff;
pub mod config;
pub mod error;
pub mod registry;
pub mod runner;
mod schema;
pub mod store;
pub mod task;

pub use backoff::backoff_delay;
pub use config::RunnerConfig;
pub use error::QueueError;
pub use registry::HandlerRegistry;
pub use runner::{RunOutcome, TaskRunner};
pub use store::SqliteTaskStore;
pub use task::{NewTask, Task, TaskStatus, TaskSummary};
