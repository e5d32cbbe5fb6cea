//! PluginHost - owns plugin records and drives their lifecycle
//!
//! ```text
//!  load ──▶ inactive ──activate──▶ active ──deactivate──▶ inactive
//!              │  ▲                  │
//!              │  └─────enable───┐   └──(activate fails)──▶ error
//!              └──disable──▶ disabled
//! ```
//!
//! Every record lives behind one lock that is never held across a plugin
//! hook. Callers must await one operation for a given id before issuing the
//! next for that id.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

use desklab_plugin_api::{
    ContextFactory, ExtensionRegistry, Listeners, Plugin, PluginManifest, Subscription,
};

use super::error::PluginHostError;

/// Lifecycle status of a loaded plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Inactive,
    Active,
    Error,
    Disabled,
}

impl PluginStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginStatus::Inactive => "inactive",
            PluginStatus::Active => "active",
            PluginStatus::Error => "error",
            PluginStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded plugin with its runtime state
struct LoadedPlugin {
    manifest: PluginManifest,
    status: PluginStatus,
    /// `None` for manifests loaded without code
    instance: Option<Arc<dyn Plugin>>,
    error: Option<String>,
}

impl LoadedPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            manifest: self.manifest.clone(),
            status: self.status,
            error: self.error.clone(),
            has_instance: self.instance.is_some(),
        }
    }
}

/// Snapshot of a plugin record
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    pub manifest: PluginManifest,
    pub status: PluginStatus,
    /// Last activation error, cleared on successful activation
    pub error: Option<String>,
    pub has_instance: bool,
}

impl PluginInfo {
    pub fn id(&self) -> &str {
        &self.manifest.id
    }
}

/// Plugin counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub error: usize,
    pub disabled: usize,
}

/// The plugin host loads plugins, activates them with a fresh context, and
/// clears their contributions when they go away
pub struct PluginHost {
    /// Records in load order
    plugins: RwLock<Vec<LoadedPlugin>>,
    contexts: ContextFactory,
    listeners: Listeners<[PluginInfo]>,
}

impl PluginHost {
    pub fn new(contexts: ContextFactory) -> Self {
        Self {
            plugins: RwLock::new(Vec::new()),
            contexts,
            listeners: Listeners::new(),
        }
    }

    /// Registry the host's plugins contribute to
    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        self.contexts.registry()
    }

    pub fn contexts(&self) -> &ContextFactory {
        &self.contexts
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<LoadedPlugin>> {
        self.plugins.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<LoadedPlugin>> {
        self.plugins.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the record for `id`, if any, under the write lock
    fn update<R>(&self, id: &str, f: impl FnOnce(&mut LoadedPlugin) -> R) -> Option<R> {
        let mut plugins = self.write();
        plugins.iter_mut().find(|p| p.manifest.id == id).map(f)
    }

    fn emit(&self) {
        let snapshot = self.plugins();
        self.listeners.notify(&snapshot);
    }

    // ─── Loading ─────────────────────────────────────────────────────

    /// Load a plugin in `inactive` status.
    ///
    /// Returns false (and changes nothing) if the id is already loaded or is
    /// not a valid plugin id.
    pub fn load(&self, manifest: PluginManifest, instance: Arc<dyn Plugin>) -> bool {
        self.insert(manifest, Some(instance))
    }

    /// Load a manifest with no code behind it. Activating it fails with
    /// [`PluginHostError::InstanceMissing`].
    pub fn load_detached(&self, manifest: PluginManifest) -> bool {
        self.insert(manifest, None)
    }

    fn insert(&self, manifest: PluginManifest, instance: Option<Arc<dyn Plugin>>) -> bool {
        if let Err(e) = manifest.validate() {
            warn!(plugin = %manifest.id, error = %e, "Rejected plugin manifest");
            return false;
        }
        {
            let mut plugins = self.write();
            if plugins.iter().any(|p| p.manifest.id == manifest.id) {
                warn!(plugin = %manifest.id, "Plugin already loaded, skipping");
                return false;
            }
            info!(
                plugin = %manifest.id,
                name = %manifest.name,
                version = %manifest.version,
                detached = instance.is_none(),
                "Loaded plugin"
            );
            plugins.push(LoadedPlugin {
                manifest,
                status: PluginStatus::Inactive,
                instance,
                error: None,
            });
        }
        self.emit();
        true
    }

    // ─── Lifecycle ───────────────────────────────────────────────────

    /// Activate a loaded plugin.
    ///
    /// On failure the record moves to `error`, anything the plugin managed to
    /// register is cleared, and the failure is returned.
    pub async fn activate(&self, id: &str) -> Result<(), PluginHostError> {
        enum Next {
            Skip,
            Missing,
            Run(Arc<dyn Plugin>, PluginManifest),
        }

        let next = self
            .update(id, |record| match record.status {
                PluginStatus::Active => {
                    warn!(plugin = %id, "Plugin already active");
                    Next::Skip
                }
                PluginStatus::Disabled => {
                    warn!(plugin = %id, "Plugin is disabled, enable it first");
                    Next::Skip
                }
                PluginStatus::Inactive | PluginStatus::Error => match record.instance.clone() {
                    Some(instance) => Next::Run(instance, record.manifest.clone()),
                    None => {
                        record.status = PluginStatus::Error;
                        record.error = Some("plugin instance missing".to_string());
                        Next::Missing
                    }
                },
            })
            .ok_or_else(|| PluginHostError::NotLoaded { id: id.to_string() })?;

        let (instance, manifest) = match next {
            Next::Skip => {
                self.emit();
                return Ok(());
            }
            Next::Missing => {
                error!(plugin = %id, "Plugin instance missing");
                self.emit();
                return Err(PluginHostError::InstanceMissing { id: id.to_string() });
            }
            Next::Run(instance, manifest) => (instance, manifest),
        };

        let ctx = self
            .contexts
            .create(id)
            .with_permissions(manifest.permissions.clone());
        let result = instance.activate(ctx).await;

        let outcome = match result {
            Ok(()) => {
                self.update(id, |record| {
                    record.status = PluginStatus::Active;
                    record.error = None;
                });
                info!(plugin = %id, name = %manifest.name, "Activated plugin");
                Ok(())
            }
            Err(e) => {
                self.update(id, |record| {
                    record.status = PluginStatus::Error;
                    record.error = Some(e.to_string());
                });
                self.registry().clear_plugin(id);
                error!(plugin = %id, error = %e, "Failed to activate plugin");
                Err(PluginHostError::ActivationFailed {
                    id: id.to_string(),
                    source: e,
                })
            }
        };

        self.emit();
        outcome
    }

    /// Deactivate an active plugin.
    ///
    /// The plugin's teardown hook runs first; its failure is logged only.
    /// Registrations are cleared either way.
    pub async fn deactivate(&self, id: &str) -> Result<(), PluginHostError> {
        let instance = self
            .update(id, |record| {
                (record.status == PluginStatus::Active).then(|| record.instance.clone())
            })
            .ok_or_else(|| PluginHostError::NotLoaded { id: id.to_string() })?;

        let Some(instance) = instance else {
            warn!(plugin = %id, "Plugin is not active");
            return Ok(());
        };

        if let Some(teardown) = instance.as_deref().and_then(|plugin| plugin.teardown())
            && let Err(e) = teardown.deactivate().await
        {
            error!(plugin = %id, error = %e, "Plugin teardown failed");
        }

        let removed = self.registry().clear_plugin(id);
        self.update(id, |record| record.status = PluginStatus::Inactive);
        info!(plugin = %id, removed, "Deactivated plugin");

        self.emit();
        Ok(())
    }

    /// Remove a plugin, deactivating it first if needed. Unknown ids are ignored.
    pub async fn unload(&self, id: &str) -> Result<(), PluginHostError> {
        let Some(status) = self.status(id) else {
            return Ok(());
        };
        if status == PluginStatus::Active {
            self.deactivate(id).await?;
        }

        let removed = {
            let mut plugins = self.write();
            let before = plugins.len();
            plugins.retain(|p| p.manifest.id != id);
            plugins.len() != before
        };
        if removed {
            info!(plugin = %id, "Unloaded plugin");
            self.emit();
        }
        Ok(())
    }

    /// Deactivate (if active) and mark disabled. Unknown ids are ignored.
    pub async fn disable(&self, id: &str) -> Result<(), PluginHostError> {
        let Some(status) = self.status(id) else {
            return Ok(());
        };
        if status == PluginStatus::Active {
            self.deactivate(id).await?;
        }
        self.update(id, |record| record.status = PluginStatus::Disabled);
        info!(plugin = %id, "Disabled plugin");
        self.emit();
        Ok(())
    }

    /// Move a disabled plugin back to `inactive`. Any other status is left alone.
    pub fn enable(&self, id: &str) -> bool {
        let enabled = self
            .update(id, |record| {
                if record.status == PluginStatus::Disabled {
                    record.status = PluginStatus::Inactive;
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false);
        if enabled {
            info!(plugin = %id, "Enabled plugin");
            self.emit();
        } else {
            debug!(plugin = %id, "Enable ignored, plugin not disabled");
        }
        enabled
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// All plugins in load order
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.read().iter().map(LoadedPlugin::info).collect()
    }

    pub fn plugin(&self, id: &str) -> Option<PluginInfo> {
        self.read()
            .iter()
            .find(|p| p.manifest.id == id)
            .map(LoadedPlugin::info)
    }

    pub fn status(&self, id: &str) -> Option<PluginStatus> {
        self.read()
            .iter()
            .find(|p| p.manifest.id == id)
            .map(|p| p.status)
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.status(id).is_some()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.status(id) == Some(PluginStatus::Active)
    }

    pub fn stats(&self) -> HostStats {
        self.read()
            .iter()
            .fold(HostStats::default(), |mut stats, plugin| {
                stats.total += 1;
                match plugin.status {
                    PluginStatus::Active => stats.active += 1,
                    PluginStatus::Inactive => stats.inactive += 1,
                    PluginStatus::Error => stats.error += 1,
                    PluginStatus::Disabled => stats.disabled += 1,
                }
                stats
            })
    }

    /// Subscribe to lifecycle changes. The listener receives every plugin
    /// after each change.
    pub fn add_listener(
        &self,
        listener: impl Fn(&[PluginInfo]) + Send + Sync + 'static,
    ) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

impl fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHost")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
