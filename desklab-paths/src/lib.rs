//! XDG Base Directory paths for desklab.
//!
//! The extension host keeps its configuration (config.toml, plugin
//! manifests, plugin preferences) under the config directory and durable
//! plugin storage under the data directory.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "desklab";

/// Resolve `$<var>/desklab`, falling back to `~/<home_relative>/desklab`.
///
/// Empty or relative values of the variable are ignored, as the XDG base
/// directory rules require.
fn xdg_dir(var: &str, home_relative: &str) -> PathBuf {
    let from_env = std::env::var_os(var)
        .map(PathBuf::from)
        .filter(|p| p.is_absolute());
    let base = match from_env {
        Some(base) => base,
        None => dirs::home_dir()
            .unwrap_or_default()
            .join(Path::new(home_relative)),
    };
    base.join(APP_DIR)
}

/// Get the desklab config directory.
///
/// Returns `$XDG_CONFIG_HOME/desklab` if set, otherwise `~/.config/desklab`.
///
/// # Examples
///
/// ```
/// use desklab_paths::config_dir;
///
/// let config_file = config_dir().join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the desklab data directory.
///
/// Returns `$XDG_DATA_HOME/desklab` if set, otherwise `~/.local/share/desklab`.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// Directory scanned for plugin manifests and holding `registry.toml`.
pub fn plugins_dir() -> PathBuf {
    config_dir().join("plugins")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugins_dir_is_under_config_dir() {
        let dir = plugins_dir();
        assert!(dir.ends_with("desklab/plugins"));
    }

    #[test]
    fn xdg_env_is_honoured_unless_relative_or_empty() {
        // All env mutation lives in this one test so parallel tests never race on it.
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/desklab-test-config");
            std::env::set_var("XDG_DATA_HOME", "relative/data");
        }
        assert_eq!(config_dir(), PathBuf::from("/tmp/desklab-test-config/desklab"));
        let data = data_dir();
        assert!(data.ends_with(".local/share/desklab"));
        assert!(!data.starts_with("relative"));

        unsafe {
            std::env::set_var("XDG_DATA_HOME", "");
        }
        assert!(data_dir().ends_with(".local/share/desklab"));

        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
            std::env::remove_var("XDG_DATA_HOME");
        }
        assert!(config_dir().ends_with(".config/desklab"));
    }
}
