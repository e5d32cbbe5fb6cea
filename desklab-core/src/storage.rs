//! Durable key-value store backed by a JSON file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, warn};

use desklab_plugin_api::{KeyValueStore, PluginError};

/// Default file name under the data directory
pub const STORAGE_FILE: &str = "plugin-storage.json";

/// Errors writing the store file
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for PluginError {
    fn from(err: StorageError) -> Self {
        PluginError::Storage(err.to_string())
    }
}

/// File-backed [`KeyValueStore`].
///
/// The whole map is rewritten on every mutation. A missing file starts empty;
/// an unreadable or corrupt file also starts empty, with a warning.
pub struct FileStore {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = Self::read_items(&path);
        debug!(path = %path.display(), items = items.len(), "Opened plugin storage");
        Self {
            path,
            items: RwLock::new(items),
        }
    }

    /// Default location under the user's data directory
    pub fn default_path() -> PathBuf {
        desklab_paths::data_dir().join(STORAGE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(path: &Path) -> BTreeMap<String, String> {
        if !path.exists() {
            return BTreeMap::new();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Plugin storage is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read plugin storage, starting empty");
                BTreeMap::new()
            }
        }
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a mutation to a copy, write it, then swap it in.
    ///
    /// The lock is held throughout. A failed write leaves memory untouched.
    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), StorageError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = items.clone();
        if f(&mut next) {
            self.persist(&next)?;
            *items = next;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), PluginError> {
        self.mutate(|items| {
            items.insert(key.to_string(), value);
            true
        })
        .map_err(Into::into)
    }

    fn remove_item(&self, key: &str) -> Result<(), PluginError> {
        self.mutate(|items| items.remove(key).is_some())
            .map_err(Into::into)
    }

    fn keys(&self) -> Vec<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desklab_plugin_api::PluginStorage;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(STORAGE_FILE);

        let store = FileStore::open(&path);
        store.set_item("plugin:wc:lastStats", "{\"words\":2}".to_string()).unwrap();
        store.set_item("plugin:wc:gone", "1".to_string()).unwrap();
        store.remove_item("plugin:wc:gone").unwrap();
        drop(store);

        let reopened = FileStore::open(&path);
        assert_eq!(
            reopened.get_item("plugin:wc:lastStats").as_deref(),
            Some("{\"words\":2}")
        );
        assert_eq!(reopened.keys(), vec!["plugin:wc:lastStats".to_string()]);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORAGE_FILE);
        std::fs::write(&path, "{{ definitely not json").unwrap();

        let store = FileStore::open(&path);
        assert!(store.keys().is_empty());

        // The next write replaces the corrupt file
        store.set_item("k", "\"v\"".to_string()).unwrap();
        assert_eq!(FileStore::open(&path).get_item("k").as_deref(), Some("\"v\""));
    }

    #[test]
    fn test_missing_file_is_empty_and_not_created_until_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORAGE_FILE);

        let store = FileStore::open(&path);
        assert!(store.keys().is_empty());
        store.remove_item("absent").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_plugin_storage_over_file_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORAGE_FILE);

        let storage = PluginStorage::new("p", Arc::new(FileStore::open(&path)));
        storage.set("count", &41).unwrap();

        let storage = PluginStorage::new("p", Arc::new(FileStore::open(&path)));
        assert_eq!(storage.get::<u32>("count"), Some(41));
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();

        let store = FileStore::open(blocker.join(STORAGE_FILE));
        assert!(store.set_item("k", "\"v\"".to_string()).is_err());
        assert_eq!(store.get_item("k"), None);
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_storage_error_converts_to_plugin_error() {
        let err: PluginError =
            StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")).into();
        assert!(matches!(err, PluginError::Storage(_)));
    }
}
