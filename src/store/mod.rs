//! Store Module - per-argument dataset containers
//!
//! A container is addressed by the command-line token (a file path) and holds
//! named values under hierarchical paths (`group/dataset`).
//!
//! Key types:
//! - `DatasetStore`: get/set/exists/delete against a container
//! - `JsonFileStore`: containers are JSON files holding nested objects
//! - `MemoryStore`: DashMap-backed store for tests and embedders
//! - `OverwritePolicy` + `Confirm`: what happens when a dataset already exists

mod json_file;
mod memory;
mod overwrite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use overwrite::{save_dataset, Answer, Confirm, OverwritePolicy, TerminalConfirm};

use serde_json::Value;

use crate::error::Result;

/// Key-value store addressed by `(container, path)`
pub trait DatasetStore: Send + Sync {
    /// True if the container exists at all
    fn has_container(&self, container: &str) -> bool;

    /// True if the container holds a dataset at `path`
    ///
    /// A missing container holds nothing.
    fn exists(&self, container: &str, path: &str) -> Result<bool>;

    /// Read a dataset
    ///
    /// Fails with `ContainerNotFound` or `MissingDataset`.
    fn get(&self, container: &str, path: &str) -> Result<Value>;

    /// Write a dataset, creating the container and intermediate groups
    fn set(&self, container: &str, path: &str, value: Value) -> Result<()>;

    /// Remove a dataset (no-op if absent)
    fn delete(&self, container: &str, path: &str) -> Result<()>;
}

/// Split `a/b/c` into its non-empty segments
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
