//! Built-in plugins and the bootstrapper that starts them

pub mod plain_text;
pub mod word_count;

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use desklab_plugin_api::{Plugin, PluginManifest};

use crate::plugins::{PluginHost, PluginPreferences};

pub use plain_text::PlainTextPlugin;
pub use word_count::{TextStats, WordCountPlugin, calculate_stats};

/// A plugin linked into the application
pub struct BuiltinPlugin {
    pub manifest: PluginManifest,
    pub instance: Arc<dyn Plugin>,
}

impl BuiltinPlugin {
    pub fn new(manifest: PluginManifest, instance: Arc<dyn Plugin>) -> Self {
        Self { manifest, instance }
    }
}

/// The plugins shipped with desklab
pub fn builtin_plugins() -> Vec<BuiltinPlugin> {
    vec![
        BuiltinPlugin::new(word_count::manifest(), Arc::new(WordCountPlugin::new())),
        BuiltinPlugin::new(plain_text::manifest(), Arc::new(PlainTextPlugin)),
    ]
}

/// Outcome of [`bootstrap`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BootstrapReport {
    pub activated: Vec<String>,
    /// `(plugin id, error message)`
    pub failed: Vec<(String, String)>,
    /// Loaded but left disabled by preference
    pub skipped: Vec<String>,
}

impl BootstrapReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Load and activate each plugin independently.
///
/// A failing plugin is recorded in the report and never stops the rest.
/// Plugins disabled in `preferences` are loaded and then disabled.
pub async fn bootstrap(
    host: &PluginHost,
    plugins: Vec<BuiltinPlugin>,
    preferences: &PluginPreferences,
) -> BootstrapReport {
    let mut report = BootstrapReport::default();

    for BuiltinPlugin { manifest, instance } in plugins {
        let id = manifest.id.clone();
        host.load(manifest, instance);

        if preferences.is_disabled(&id) {
            match host.disable(&id).await {
                Ok(()) => report.skipped.push(id),
                Err(e) => report.failed.push((id, e.to_string())),
            }
            continue;
        }

        match host.activate(&id).await {
            Ok(()) => report.activated.push(id),
            Err(e) => {
                error!(plugin = %id, error = %e, "Failed to start built-in plugin");
                report.failed.push((id, e.to_string()));
            }
        }
    }

    info!(
        activated = report.activated.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "Built-in plugins started"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_unique() {
        let plugins = builtin_plugins();
        let mut ids: Vec<&str> = plugins.iter().map(|p| p.manifest.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), plugins.len());
        assert!(ids.iter().all(|id| id.starts_with("builtin.")));
    }

    #[test]
    fn test_report_is_clean() {
        let mut report = BootstrapReport::default();
        assert!(report.is_clean());
        report.failed.push(("x".into(), "boom".into()));
        assert!(!report.is_clean());
    }
}
