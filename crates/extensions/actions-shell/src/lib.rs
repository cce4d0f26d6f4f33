//! Allow-listed program execution for Aether.
//!
//! Programs run from an argument vector; no shell interpreter is involved.

mod exec;

use std::sync::Arc;

use aether_actions_files::Sandbox;
use aether_protocols::TaskHandler;

pub use exec::{ShellExecHandler, ShellPolicy, ShellResult, shell, tail_chars};

/// Handler for `shell.exec`.
pub fn handlers(policy: Arc<ShellPolicy>, sandbox: Arc<Sandbox>) -> Vec<Arc<dyn TaskHandler>> {
    vec![Arc::new(ShellExecHandler::new(policy, sandbox))]
}
