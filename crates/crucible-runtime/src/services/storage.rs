//! Item storage backends.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Keyed JSON item storage.
///
/// The unit of storage is a named JSON value; reads return only the keys
/// that exist.  Backends are selected by the `runtime.storage` setting.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads the requested items.  Missing keys are simply absent from the
    /// returned map.
    async fn read(&self, keys: &[&str]) -> anyhow::Result<HashMap<String, Value>>;

    /// Writes every item in `changes`, replacing existing values.
    async fn write(&self, changes: HashMap<String, Value>) -> anyhow::Result<()>;

    /// Deletes the named items.  Deleting a missing key is not an error.
    async fn delete(&self, keys: &[&str]) -> anyhow::Result<()>;
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// Process-local storage; the default backend.
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, keys: &[&str]) -> anyhow::Result<HashMap<String, Value>> {
        let items = self.items.read();
        Ok(keys
            .iter()
            .filter_map(|key| items.get(*key).map(|value| ((*key).to_string(), value.clone())))
            .collect())
    }

    async fn write(&self, changes: HashMap<String, Value>) -> anyhow::Result<()> {
        let mut items = self.items.write();
        for (key, value) in changes {
            items.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> anyhow::Result<()> {
        let mut items = self.items.write();
        for key in keys {
            items.remove(*key);
        }
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// Settings for the file-backed storage backend.
///
/// `directory` is mandatory when `runtime.storage = "file"` is selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStorageSettings {
    /// Directory the items are persisted under, one JSON file per key.
    pub directory: PathBuf,
}

/// One-file-per-item JSON storage under a configured directory.
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Creates a store over the configured directory.  The directory is
    /// created on first write.
    pub fn new(settings: &FileStorageSettings) -> Self {
        Self {
            directory: settings.directory.clone(),
        }
    }

    /// Item keys may contain separators ("conversation/abc"); flatten them
    /// into a safe file name.
    fn item_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                other => other,
            })
            .collect();
        self.directory.join(format!("{name}.json"))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn read(&self, keys: &[&str]) -> anyhow::Result<HashMap<String, Value>> {
        let mut items = HashMap::new();
        for key in keys {
            let path = self.item_path(key);
            match tokio::fs::read_to_string(&path).await {
                Ok(raw) => {
                    let value: Value = serde_json::from_str(&raw)?;
                    items.insert((*key).to_string(), value);
                }
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => return Err(error.into()),
            }
        }
        Ok(items)
    }

    async fn write(&self, changes: HashMap<String, Value>) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        for (key, value) in changes {
            let path = self.item_path(&key);
            tokio::fs::write(&path, serde_json::to_vec_pretty(&value)?).await?;
            debug!(key = %key, path = %path.display(), "Item persisted");
        }
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> anyhow::Result<()> {
        for key in keys {
            match tokio::fs::remove_file(self.item_path(key)).await {
                Ok(()) => {}
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => return Err(error.into()),
            }
        }
        Ok(())
    }
}
