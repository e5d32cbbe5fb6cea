//! Plugin system for desklab
//!
//! This module provides the infrastructure for loading and managing plugins:
//!
//! - [`PluginHost`]: owns plugin records and runs the activate/deactivate lifecycle
//! - [`PluginPreferences`]: persisted set of plugins the user disabled
//! - [`discover_manifests`]: finds `plugin.toml` manifests on disk
//! - [`PluginHostError`]: Error types for plugin operations
//!
//! # Plugin Discovery
//!
//! Manifests are discovered from the configured plugin directories, by
//! default:
//! 1. Project plugins: `.desklab/plugins/` (takes precedence)
//! 2. User plugins: `~/.config/desklab/plugins/`
//!
//! Each plugin directory holds a `plugin.toml`. Discovered manifests are
//! loaded without code; only plugins linked into the application can run.
//!
//! # Example
//!
//! ```ignore
//! let host = PluginHost::new(contexts);
//! host.load(manifest, Arc::new(MyPlugin));
//! host.activate("my-plugin").await?;
//! host.disable("my-plugin").await?;
//! ```

mod discovery;
mod error;
mod host;
mod preferences;

pub use discovery::{DiscoveredManifest, MANIFEST_FILE, discover_manifests, read_manifest};
pub use error::PluginHostError;
pub use host::{HostStats, PluginHost, PluginInfo, PluginStatus};
pub use preferences::{PREFERENCES_FILE, PluginPreferences};
