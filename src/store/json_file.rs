//! JSON file containers
//!
//! Each container is a file holding one JSON object; a dataset path
//! `a/b/c` addresses `{"a": {"b": {"c": ...}}}`.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::{segments, DatasetStore};
use crate::error::{BindError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileStore;

impl JsonFileStore {
    pub fn new() -> Self {
        Self
    }

    fn read(&self, container: &str) -> Result<Option<Value>> {
        if !Path::new(container).is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(container)?;
        if text.trim().is_empty() {
            return Ok(Some(Value::Object(Map::new())));
        }
        let root: Value = serde_json::from_str(&text).map_err(|e| BindError::Store {
            container: container.to_string(),
            reason: e.to_string(),
        })?;
        if !root.is_object() {
            return Err(BindError::Store {
                container: container.to_string(),
                reason: "top level is not an object".to_string(),
            });
        }
        Ok(Some(root))
    }

    fn write(&self, container: &str, root: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(root)?;
        fs::write(container, text + "\n")?;
        Ok(())
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |node, key| node.as_object()?.get(key))
}

impl DatasetStore for JsonFileStore {
    fn has_container(&self, container: &str) -> bool {
        Path::new(container).is_file()
    }

    fn exists(&self, container: &str, path: &str) -> Result<bool> {
        Ok(self
            .read(container)?
            .is_some_and(|root| lookup(&root, path).is_some()))
    }

    fn get(&self, container: &str, path: &str) -> Result<Value> {
        let root = self.read(container)?.ok_or_else(|| BindError::ContainerNotFound {
            container: container.to_string(),
        })?;
        lookup(&root, path)
            .cloned()
            .ok_or_else(|| BindError::MissingDataset {
                container: container.to_string(),
                path: path.to_string(),
            })
    }

    fn set(&self, container: &str, path: &str, value: Value) -> Result<()> {
        let mut root = self
            .read(container)?
            .unwrap_or_else(|| Value::Object(Map::new()));
        let keys: Vec<&str> = segments(path).collect();
        let Some((last, groups)) = keys.split_last() else {
            return Err(BindError::Store {
                container: container.to_string(),
                reason: format!("empty dataset path '{}'", path),
            });
        };

        let mut node = &mut root;
        for key in groups {
            let Value::Object(map) = node else {
                return Err(BindError::Store {
                    container: container.to_string(),
                    reason: format!("'{}' is not a group", key),
                });
            };
            node = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        let Value::Object(map) = node else {
            return Err(BindError::Store {
                container: container.to_string(),
                reason: format!("parent of '{}' is not a group", last),
            });
        };
        map.insert(last.to_string(), value);

        debug!(container, path, "dataset written");
        self.write(container, &root)
    }

    fn delete(&self, container: &str, path: &str) -> Result<()> {
        let Some(mut root) = self.read(container)? else {
            return Ok(());
        };
        let keys: Vec<&str> = segments(path).collect();
        let Some((last, groups)) = keys.split_last() else {
            return Ok(());
        };
        let parent = groups
            .iter()
            .try_fold(&mut root, |node, key| node.as_object_mut()?.get_mut(*key));
        if let Some(Value::Object(map)) = parent {
            if map.remove(*last).is_some() {
                return self.write(container, &root);
            }
        }
        Ok(())
    }
}
