//! Manifest discovery - finds `plugin.toml` files on disk

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use desklab_plugin_api::PluginManifest;

use super::error::PluginHostError;

/// Manifest file name inside a plugin directory
pub const MANIFEST_FILE: &str = "plugin.toml";

/// A manifest found on disk
#[derive(Debug, Clone)]
pub struct DiscoveredManifest {
    pub manifest: PluginManifest,
    /// Directory the manifest was read from
    pub dir: PathBuf,
}

/// Read one manifest file
pub fn read_manifest(path: &Path) -> Result<PluginManifest, PluginHostError> {
    let content = std::fs::read_to_string(path)?;
    PluginManifest::from_toml_str(&content).map_err(|e| PluginHostError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Scan `<dir>/<name>/plugin.toml` under each directory.
///
/// Missing directories are skipped. Unreadable manifests are logged and
/// skipped. When two manifests share an id the earlier directory wins.
/// Entries within one directory are visited in name order.
pub fn discover_manifests(dirs: &[PathBuf]) -> Vec<DiscoveredManifest> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping plugin directory");
                continue;
            }
        };

        let mut plugin_dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.join(MANIFEST_FILE).is_file())
            .collect();
        plugin_dirs.sort();

        for plugin_dir in plugin_dirs {
            match read_manifest(&plugin_dir.join(MANIFEST_FILE)) {
                Ok(manifest) => {
                    if !seen.insert(manifest.id.clone()) {
                        debug!(plugin = %manifest.id, dir = %plugin_dir.display(), "Shadowed manifest");
                        continue;
                    }
                    found.push(DiscoveredManifest {
                        manifest,
                        dir: plugin_dir,
                    });
                }
                Err(e) => warn!(error = %e, "Skipping plugin manifest"),
            }
        }
    }

    found
}
