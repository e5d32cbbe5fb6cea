//! ExtensionHost - one explicit instance wiring registry, contexts, and host

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use desklab_plugin_api::{
    ConfirmPrompt, ContextFactory, ExtensionRegistry, FixedAnswer, KeyValueStore, MemoryStore,
    NotificationBus,
};

use crate::builtin::{BootstrapReport, BuiltinPlugin, bootstrap};
use crate::config::HostConfig;
use crate::error::DesklabError;
use crate::plugins::{PluginHost, PluginHostError, PluginPreferences, discover_manifests};
use crate::storage::FileStore;

/// Outcome of [`ExtensionHost::start`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct StartReport {
    pub bootstrap: BootstrapReport,
    /// Ids of manifests found on disk and loaded without code
    pub discovered: Vec<String>,
}

/// The extension host: registry, context factory, and plugin host together.
pub struct ExtensionHost {
    config: HostConfig,
    notifications: NotificationBus,
    plugins: PluginHost,
    preferences_path: PathBuf,
}

impl ExtensionHost {
    pub fn new(
        config: HostConfig,
        store: Arc<dyn KeyValueStore>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        let registry = Arc::new(ExtensionRegistry::new());
        let notifications = NotificationBus::new(config.notification_capacity);
        let contexts = ContextFactory::new(registry, store, notifications.clone(), confirm);
        Self {
            config,
            notifications,
            plugins: PluginHost::new(contexts),
            preferences_path: PluginPreferences::default_path(),
        }
    }

    /// Host backed by the durable file store at `config.storage_path`
    pub fn with_file_store(config: HostConfig, confirm: Arc<dyn ConfirmPrompt>) -> Self {
        let store = Arc::new(FileStore::open(&config.storage_path));
        Self::new(config, store, confirm)
    }

    /// Host with in-process storage that answers confirmations with
    /// `config.confirm_default`
    pub fn in_memory(config: HostConfig) -> Self {
        let confirm = Arc::new(FixedAnswer(config.confirm_default));
        Self::new(config, Arc::new(MemoryStore::new()), confirm)
    }

    pub fn with_preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences_path = path.into();
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn plugins(&self) -> &PluginHost {
        &self.plugins
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        self.plugins.registry()
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.notifications
    }

    pub fn preferences_path(&self) -> &Path {
        &self.preferences_path
    }

    pub fn load_preferences(&self) -> Result<PluginPreferences, PluginHostError> {
        PluginPreferences::load(&self.preferences_path)
    }

    /// Start the given built-ins, then load manifests discovered on disk.
    pub async fn start(&self, builtins: Vec<BuiltinPlugin>) -> Result<StartReport, DesklabError> {
        let preferences = self.load_preferences()?;
        let bootstrap = bootstrap(&self.plugins, builtins, &preferences).await;

        let mut discovered = Vec::new();
        for found in discover_manifests(&self.config.plugin_dirs) {
            let id = found.manifest.id.clone();
            if !self.plugins.load_detached(found.manifest) {
                continue;
            }
            if preferences.is_disabled(&id) {
                self.plugins.disable(&id).await?;
            }
            discovered.push(id);
        }

        info!(
            plugins = self.plugins.stats().total,
            extensions = self.registry().stats().total,
            "Extension host started"
        );
        Ok(StartReport {
            bootstrap,
            discovered,
        })
    }

    /// Persist an enable/disable choice and apply it to the running host.
    ///
    /// Enabling a loaded plugin with code also activates it.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), DesklabError> {
        let mut preferences = self.load_preferences()?;
        let changed = if enabled {
            preferences.enable(id)
        } else {
            preferences.disable(id)
        };
        if changed {
            preferences.save(&self.preferences_path)?;
        }

        if !self.plugins.is_loaded(id) {
            warn!(plugin = %id, "Preference saved for a plugin that is not loaded");
            return Ok(());
        }

        if enabled {
            let has_instance = self.plugins.plugin(id).is_some_and(|p| p.has_instance);
            if self.plugins.enable(id) && has_instance {
                self.plugins.activate(id).await?;
            }
        } else {
            self.plugins.disable(id).await?;
        }
        Ok(())
    }

    /// Deactivate every active plugin, most recently loaded first
    pub async fn shutdown(&self) {
        for plugin in self.plugins.plugins().iter().rev() {
            if !self.plugins.is_active(plugin.id()) {
                continue;
            }
            if let Err(e) = self.plugins.deactivate(plugin.id()).await {
                warn!(plugin = %plugin.id(), error = %e, "Failed to deactivate plugin");
            }
        }
    }
}

impl std::fmt::Debug for ExtensionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionHost")
            .field("config", &self.config)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}
