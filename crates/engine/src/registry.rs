//! Resource registry
//!
//! Concurrent map from `type + "\x00" + id` to the one live instance of that
//! resource. Insertion is insert-if-absent: when two workers race to build the
//! same resource, the first insert wins and the other instance is dropped
//! without ever being handed out.
//!
//! Child connections share their parent's registry, so the map is held in an
//! `Arc` by every runtime that uses it.

use crate::resource::Resource;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Separator between type name and ID in registry keys
pub const KEY_SEPARATOR: char = '\x00';

/// Concurrent map of live resources
#[derive(Debug, Default)]
pub struct Registry {
    resources: DashMap<String, Arc<dyn Resource>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry key of `(name, id)`
    pub fn key(name: &str, id: &str) -> String {
        let mut key = String::with_capacity(name.len() + id.len() + 1);
        key.push_str(name);
        key.push(KEY_SEPARATOR);
        key.push_str(id);
        key
    }

    /// Look up a resource
    pub fn get(&self, name: &str, id: &str) -> Option<Arc<dyn Resource>> {
        self.get_key(&Self::key(name, id))
    }

    pub(crate) fn get_key(&self, key: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether `(name, id)` is registered
    pub fn contains(&self, name: &str, id: &str) -> bool {
        self.resources.contains_key(&Self::key(name, id))
    }

    /// Register `resource` unless its key is taken; return the registered instance
    pub fn insert_if_absent(&self, resource: Arc<dyn Resource>) -> Arc<dyn Resource> {
        let key = Self::key(resource.type_name(), resource.id());
        match self.resources.entry(key) {
            Entry::Occupied(existing) => Arc::clone(existing.get()),
            Entry::Vacant(slot) => {
                debug!(
                    target: "factgraph::registry",
                    resource = resource.type_name(),
                    id = resource.id(),
                    "Resource registered"
                );
                slot.insert(Arc::clone(&resource));
                resource
            }
        }
    }

    /// Number of live resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no resource is registered
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Drop every resource
    pub fn clear(&self) {
        self.resources.clear();
    }
}
