//! Host configuration, layered from defaults, user, and project files

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use desklab_plugin_api::NotificationBus;

use crate::storage::FileStore;

/// Environment variable overriding the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "DESKLAB_PROJECT_CONFIG_DIR";

/// Config file name in both the user and project directories
pub const CONFIG_FILE: &str = "config.toml";

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Configuration as stored in TOML files (optional fields for merging)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHostConfig {
    pub storage_path: Option<PathBuf>,
    pub plugin_dirs: Option<Vec<PathBuf>>,
    pub notification_capacity: Option<usize>,
    pub confirm_default: Option<bool>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// JSON file holding plugin storage
    pub storage_path: PathBuf,
    /// Directories scanned for `plugin.toml` manifests, highest precedence first
    pub plugin_dirs: Vec<PathBuf>,
    /// Broadcast capacity of the notification bus
    pub notification_capacity: usize,
    /// Answer given to confirmations when nobody can be asked
    pub confirm_default: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        ConfigLoader::finalize(RawHostConfig::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<HostConfig, ConfigError> {
        Self::load_from(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Load from explicit user and project config paths. Missing files are skipped.
    pub fn load_from(user_path: &Path, project_path: &Path) -> Result<HostConfig, ConfigError> {
        let mut raw = RawHostConfig::default();

        // Layer 1: User config
        if let Some(user) = Self::read_layer(user_path)? {
            raw = Self::merge_raw(raw, user);
        }

        // Layer 2: Project config
        if let Some(project) = Self::read_layer(project_path)? {
            raw = Self::merge_raw(raw, project);
        }

        Ok(Self::finalize(raw))
    }

    fn read_layer(path: &Path) -> Result<Option<RawHostConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn user_config_path() -> PathBuf {
        desklab_paths::config_dir().join(CONFIG_FILE)
    }

    /// Project config directory.
    /// Can be overridden with DESKLAB_PROJECT_CONFIG_DIR (useful for isolated tests)
    pub fn project_config_dir() -> PathBuf {
        match std::env::var(PROJECT_CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => PathBuf::from(".desklab"),
        }
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_config_dir().join(CONFIG_FILE)
    }

    /// Merge two raw configs (overlay values override base only if set)
    fn merge_raw(base: RawHostConfig, overlay: RawHostConfig) -> RawHostConfig {
        RawHostConfig {
            storage_path: overlay.storage_path.or(base.storage_path),
            plugin_dirs: overlay.plugin_dirs.or(base.plugin_dirs),
            notification_capacity: overlay
                .notification_capacity
                .or(base.notification_capacity),
            confirm_default: overlay.confirm_default.or(base.confirm_default),
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawHostConfig) -> HostConfig {
        HostConfig {
            storage_path: raw.storage_path.unwrap_or_else(FileStore::default_path),
            plugin_dirs: raw.plugin_dirs.unwrap_or_else(|| {
                vec![
                    Self::project_config_dir().join("plugins"),
                    desklab_paths::plugins_dir(),
                ]
            }),
            notification_capacity: raw
                .notification_capacity
                .unwrap_or(NotificationBus::DEFAULT_CAPACITY),
            confirm_default: raw.confirm_default.unwrap_or(false),
        }
    }
}
