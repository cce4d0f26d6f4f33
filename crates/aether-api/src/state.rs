//! Application state shared across handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use aether_runtime::AetherRuntime;

pub struct AppState {
    pub runtime: Arc<AetherRuntime>,
    request_count: AtomicU64,
}

impl AppState {
    pub fn new(runtime: Arc<AetherRuntime>) -> Self {
        Self {
            runtime,
            request_count: AtomicU64::new(0),
        }
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn increment_requests(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }
}
