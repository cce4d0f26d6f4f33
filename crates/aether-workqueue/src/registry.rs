//! Handler registry keyed by task type.

use std::sync::Arc;

use aether_protocols::{BaseRegistry, TaskHandler};

use crate::error::QueueError;

/// Fixed mapping from `task_type` to the handler serving it.
pub struct HandlerRegistry {
    inner: BaseRegistry<dyn TaskHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            inner: BaseRegistry::new(),
        }
    }

    /// Register a handler. A task type can only be registered once.
    pub fn register(&self, handler: Arc<dyn TaskHandler>) -> Result<(), QueueError> {
        self.inner.register(handler)?;
        Ok(())
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskHandler>> {
        self.inner.get(task_type)
    }

    pub fn contains(&self, task_type: &str) -> bool {
        self.inner.contains(task_type)
    }

    /// Registered task types, sorted.
    pub fn task_types(&self) -> Vec<String> {
        self.inner.list_ids()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
