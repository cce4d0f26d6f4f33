//! Generic id-keyed registry.
//!
//! Shared by the task handler registry and the command router so both reject
//! duplicate registrations the same way.

use dashmap::DashMap;
use std::sync::Arc;

use crate::error::RegistryError;

/// Trait for items that can be stored in a registry.
pub trait Registerable: Send + Sync {
    /// Returns the unique identifier for this item.
    fn registry_id(&self) -> &str;
}

/// Thread-safe registry of trait objects keyed by id.
pub struct BaseRegistry<T: ?Sized + Registerable> {
    items: DashMap<String, Arc<T>>,
}

impl<T: ?Sized + Registerable> BaseRegistry<T> {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Register an item. Fails if the id is already taken.
    pub fn register(&self, item: Arc<T>) -> Result<(), RegistryError> {
        let id = item.registry_id().to_string();

        if self.items.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }

        self.items.insert(id, item);
        Ok(())
    }

    pub fn unregister(&self, id: &str) -> Result<(), RegistryError> {
        self.items
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.items.get(id).map(|item| item.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.items.iter().map(|item| item.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: ?Sized + Registerable> Default for BaseRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
