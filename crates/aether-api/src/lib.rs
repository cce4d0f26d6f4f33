//! # Aether API
//!
//! Thin HTTP shim over [`AetherRuntime`](aether_runtime::AetherRuntime):
//!
//! ```text
//! GET  /api/health      liveness
//! GET  /api/status      recent tasks and heartbeat
//! POST /api/enqueue     {task_type, payload, priority, timeout_s, max_attempts}
//! GET  /api/task/{id}   task snapshot, 404 when absent
//! POST /api/command     {command} routed through the command router
//! ```

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use server::ApiServer;
pub use state::AppState;
