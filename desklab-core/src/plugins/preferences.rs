//! Plugin preferences - which plugins the user has switched off

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::error::PluginHostError;

/// File name of the preferences file inside the plugins directory
pub const PREFERENCES_FILE: &str = "registry.toml";

/// Persisted plugin preferences
///
/// Stored as TOML in `~/.config/desklab/plugins/registry.toml`
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginPreferences {
    /// Ids of plugins that stay disabled across restarts
    #[serde(default)]
    pub disabled: BTreeSet<String>,
}

impl PluginPreferences {
    /// Default location under the user's config directory
    pub fn default_path() -> PathBuf {
        desklab_paths::plugins_dir().join(PREFERENCES_FILE)
    }

    /// Load preferences from a TOML file
    ///
    /// Returns empty preferences if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, PluginHostError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PluginHostError::Registry(e.to_string()))
    }

    /// Save preferences to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), PluginHostError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PluginHostError::Registry(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled.contains(id)
    }

    /// Mark a plugin disabled. Returns false if it already was.
    pub fn disable(&mut self, id: &str) -> bool {
        self.disabled.insert(id.to_string())
    }

    /// Clear a plugin's disabled mark. Returns false if it was not set.
    pub fn enable(&mut self, id: &str) -> bool {
        self.disabled.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_empty() {
        assert!(PluginPreferences::default().disabled.is_empty());
    }

    #[test]
    fn test_enable_disable() {
        let mut prefs = PluginPreferences::default();

        assert!(prefs.disable("builtin.word-count"));
        assert!(!prefs.disable("builtin.word-count"));
        assert!(prefs.is_disabled("builtin.word-count"));
        assert!(!prefs.is_disabled("other"));

        assert!(prefs.enable("builtin.word-count"));
        assert!(!prefs.enable("builtin.word-count"));
        assert!(!prefs.is_disabled("builtin.word-count"));
    }

    #[test]
    fn test_load_missing_file() {
        let prefs = PluginPreferences::load(Path::new("/nonexistent/path/registry.toml")).unwrap();
        assert!(prefs.disabled.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/plugins").join(PREFERENCES_FILE);

        let mut prefs = PluginPreferences::default();
        prefs.disable("csv-tools");
        prefs.save(&path).unwrap();

        let loaded = PluginPreferences::load(&path).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn test_load_invalid_toml_is_registry_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PREFERENCES_FILE);
        std::fs::write(&path, "disabled = 3").unwrap();

        let err = PluginPreferences::load(&path).unwrap_err();
        assert!(matches!(err, PluginHostError::Registry(_)));
    }

    #[test]
    fn test_default_path_ends_with_registry_toml() {
        assert!(PluginPreferences::default_path().ends_with("plugins/registry.toml"));
    }
}
