//! Plugin host error types

use std::path::PathBuf;
use thiserror::Error;

use desklab_plugin_api::PluginError;

/// Errors that can occur in the plugin host
#[derive(Error, Debug)]
pub enum PluginHostError {
    /// No plugin with this id has been loaded
    #[error("Plugin '{id}' is not loaded")]
    NotLoaded { id: String },

    /// The plugin was loaded from a manifest alone and has no code to run
    #[error("Plugin '{id}': plugin instance missing")]
    InstanceMissing { id: String },

    /// The plugin's activate hook failed
    #[error("Plugin '{id}' failed to activate: {source}")]
    ActivationFailed {
        id: String,
        #[source]
        source: PluginError,
    },

    /// Preferences file error (parsing, saving, etc.)
    #[error("Registry error: {0}")]
    Registry(String),

    /// A plugin manifest could not be read
    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
