//! Plugin storage - namespaced JSON values over a shared key-value store

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::error::PluginError;

/// The host's persistent string key-value store.
///
/// Every plugin shares one store; [`PluginStorage`] keeps them apart by
/// prefixing keys.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String) -> Result<(), PluginError>;
    fn remove_item(&self, key: &str) -> Result<(), PluginError>;
    /// All keys currently in the store
    fn keys(&self) -> Vec<String>;
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), PluginError> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PluginError> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
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

/// A plugin's view of the store, scoped to `plugin:<plugin_id>:`
#[derive(Clone)]
pub struct PluginStorage {
    prefix: String,
    store: Arc<dyn KeyValueStore>,
}

impl PluginStorage {
    pub fn new(plugin_id: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            prefix: format!("plugin:{plugin_id}:"),
            store,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Read a value. Missing and undecodable values both read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get_item(&self.full_key(key))?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key = %self.full_key(key), error = %e, "Ignoring corrupt storage value");
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PluginError> {
        let raw = serde_json::to_string(value)?;
        self.store.set_item(&self.full_key(key), raw)
    }

    pub fn remove(&self, key: &str) -> Result<(), PluginError> {
        self.store.remove_item(&self.full_key(key))
    }

    /// Plugin-local keys (prefix stripped)
    pub fn keys(&self) -> Vec<String> {
        self.store
            .keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect()
    }

    /// Remove every key in this plugin's namespace
    pub fn clear(&self) -> Result<(), PluginError> {
        for key in self.keys() {
            self.remove(&key)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PluginStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginStorage")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
