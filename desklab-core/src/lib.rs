//! desklab-core: Core library for the desklab extension host
//!
//! This crate provides the runtime side of the plugin system:
//!
//! - **Plugin host** - [`PluginHost`] loads plugins and drives their lifecycle
//! - **Storage** - [`FileStore`], a durable key-value store for plugin data
//! - **Built-in plugins** - word count and plain text, started by [`bootstrap`]
//! - **Configuration** - [`HostConfig`] layered from user and project files
//! - **Application context** - [`ExtensionHost`] wires all of the above
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use desklab_core::{ExtensionHost, HostConfig, builtin_plugins};
//! use desklab_plugin_api::FixedAnswer;
//!
//! async fn example() -> Result<(), desklab_core::DesklabError> {
//!     let app = ExtensionHost::with_file_store(HostConfig::default(), Arc::new(FixedAnswer(false)));
//!     app.start(builtin_plugins()).await?;
//!
//!     for command in app.registry().commands() {
//!         println!("{} - {}", command.id, command.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  ExtensionHost                   │
//! │  ┌────────────┐   ┌──────────────────────────┐   │
//! │  │ PluginHost │──▶│ ContextFactory           │   │
//! │  │ (records)  │   │  ├─ ExtensionRegistry    │   │
//! │  └────────────┘   │  ├─ KeyValueStore        │   │
//! │                   │  ├─ NotificationBus      │   │
//! │                   │  └─ ConfirmPrompt        │   │
//! │                   └──────────────────────────┘   │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod builtin;
pub mod config;
pub mod error;
pub mod plugins;
pub mod storage;

// Re-export key types for convenience
pub use app::{ExtensionHost, StartReport};
pub use builtin::{BootstrapReport, BuiltinPlugin, bootstrap, builtin_plugins};
pub use config::{ConfigError, ConfigLoader, HostConfig};
pub use error::DesklabError;
pub use plugins::{
    HostStats, PluginHost, PluginHostError, PluginInfo, PluginPreferences, PluginStatus,
    discover_manifests,
};
pub use storage::{FileStore, StorageError};
