//! # Aether Runtime
//!
//! The single long-lived service object. [`AetherRuntime`] is built once
//! from a [`Config`](aether_config::Config) and owns the task store, the
//! handler registry, the runner pool, the orchestrator heartbeat and the
//! command router. Interfaces (CLI, HTTP API) receive it explicitly.

pub mod commands;
pub mod error;
pub mod register;
pub mod router;
pub mod runtime;
pub mod services;

pub use error::RuntimeError;
pub use register::register_builtin_handlers;
pub use router::CommandRouter;
pub use runtime::AetherRuntime;
pub use services::{EnqueueRequest, Services, StoreProbe};
