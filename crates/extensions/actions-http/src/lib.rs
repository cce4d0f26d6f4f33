//! Domain-restricted JSON HTTP for Aether.
//!
//! The default posture is deny-all: with an empty allowlist every request
//! is rejected before any connection is made.

mod http_json;

use std::sync::Arc;

use aether_protocols::TaskHandler;

pub use http_json::{HttpActions, HttpJsonHandler, HttpPolicy, HttpResult};

/// Handler for `http.json`.
pub fn handlers(actions: Arc<HttpActions>) -> Vec<Arc<dyn TaskHandler>> {
    vec![Arc::new(HttpJsonHandler::new(actions))]
}
