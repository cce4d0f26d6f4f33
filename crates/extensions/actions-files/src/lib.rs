//! Sandboxed file actions for Aether.
//!
//! Every path is resolved against a fixed base directory and rejected with a
//! policy error when it escapes it.

mod actions;
mod sandbox;

use std::sync::Arc;

use aether_protocols::TaskHandler;

pub use actions::*;
pub use sandbox::Sandbox;

/// Handlers for `files.write_text`, `files.read_text` and `files.list_dir`.
pub fn handlers(sandbox: Arc<Sandbox>, read_max_bytes: u64) -> Vec<Arc<dyn TaskHandler>> {
    vec![
        Arc::new(WriteTextHandler::new(sandbox.clone())),
        Arc::new(ReadTextHandler::new(sandbox.clone(), read_max_bytes)),
        Arc::new(ListDirHandler::new(sandbox)),
    ]
}
