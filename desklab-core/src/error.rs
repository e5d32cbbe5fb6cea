//! Error types for desklab-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::plugins::PluginHostError;
use crate::storage::StorageError;

/// Top-level error type for desklab-core
#[derive(Error, Debug)]
pub enum DesklabError {
    #[error("Plugin host error: {0}")]
    Host(#[from] PluginHostError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
