//! In-memory dataset store (DashMap, lock-free)

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{segments, DatasetStore};
use crate::error::{BindError, Result};

/// Containers → normalized dataset path → value
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    containers: Arc<DashMap<String, FxHashMap<String, Value>>>,
}

fn normalize(path: &str) -> String {
    segments(path).collect::<Vec<_>>().join("/")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty container (a file that exists but holds nothing)
    pub fn create(&self, container: impl Into<String>) {
        self.containers.entry(container.into()).or_default();
    }

    /// Seed a dataset, creating the container if needed
    pub fn with(self, container: &str, path: &str, value: Value) -> Self {
        self.containers
            .entry(container.to_string())
            .or_default()
            .insert(normalize(path), value);
        self
    }

    /// Sorted dataset paths of a container
    pub fn paths(&self, container: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .containers
            .get(container)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

impl DatasetStore for MemoryStore {
    fn has_container(&self, container: &str) -> bool {
        self.containers.contains_key(container)
    }

    fn exists(&self, container: &str, path: &str) -> Result<bool> {
        Ok(self
            .containers
            .get(container)
            .is_some_and(|c| c.contains_key(&normalize(path))))
    }

    fn get(&self, container: &str, path: &str) -> Result<Value> {
        let entry = self
            .containers
            .get(container)
            .ok_or_else(|| BindError::ContainerNotFound {
                container: container.to_string(),
            })?;
        entry
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| BindError::MissingDataset {
                container: container.to_string(),
                path: path.to_string(),
            })
    }

    fn set(&self, container: &str, path: &str, value: Value) -> Result<()> {
        self.containers
            .entry(container.to_string())
            .or_default()
            .insert(normalize(path), value);
        Ok(())
    }

    fn delete(&self, container: &str, path: &str) -> Result<()> {
        if let Some(mut entry) = self.containers.get_mut(container) {
            entry.remove(&normalize(path));
        }
        Ok(())
    }
}
