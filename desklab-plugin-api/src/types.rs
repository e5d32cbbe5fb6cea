//! Plugin types and metadata structures

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PluginError;

/// Plugin manifest containing static metadata about the plugin.
///
/// Manifests are immutable once handed to the host. They can be declared in
/// code (built-in plugins) or read from a `plugin.toml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Globally unique plugin identifier (also the qualification prefix)
    pub id: String,
    /// Display name
    pub name: String,
    /// Plugin version (semver)
    pub version: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Plugin author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Entry point, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    /// Extension points this plugin contributes to
    #[serde(default, alias = "extensionPoints")]
    pub extension_points: Vec<ExtensionKind>,
    /// Permissions this plugin declares
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl PluginManifest {
    /// Create a manifest with the given id and name and default metadata
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a manifest from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, PluginError> {
        let manifest: Self =
            toml::from_str(content).map_err(|e| PluginError::Serialization(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the id can own qualified extension ids: non-empty, no `:`
    pub fn validate(&self) -> Result<(), PluginError> {
        if self.id.trim().is_empty() {
            return Err(PluginError::InvalidInput(
                "manifest id must not be empty".to_string(),
            ));
        }
        if self.id.contains(':') {
            return Err(PluginError::InvalidInput(format!(
                "manifest id must not contain ':': {}",
                self.id
            )));
        }
        Ok(())
    }

    /// Whether the manifest declares the given extension point
    pub fn declares(&self, kind: ExtensionKind) -> bool {
        self.extension_points.contains(&kind)
    }
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            version: "0.0.1".to_string(),
            description: String::new(),
            author: None,
            main: None,
            extension_points: Vec::new(),
            permissions: Vec::new(),
        }
    }
}

/// The five kinds of extension point a plugin can contribute to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtensionKind {
    Toolbar,
    Sidebar,
    Command,
    FileHandler,
    ExportFormat,
}

impl ExtensionKind {
    /// All kinds, in display order
    pub const ALL: [ExtensionKind; 5] = [
        ExtensionKind::Toolbar,
        ExtensionKind::Sidebar,
        ExtensionKind::Command,
        ExtensionKind::FileHandler,
        ExtensionKind::ExportFormat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKind::Toolbar => "toolbar",
            ExtensionKind::Sidebar => "sidebar",
            ExtensionKind::Command => "command",
            ExtensionKind::FileHandler => "fileHandler",
            ExtensionKind::ExportFormat => "exportFormat",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ExtensionKind::Toolbar => 0,
            ExtensionKind::Sidebar => 1,
            ExtensionKind::Command => 2,
            ExtensionKind::FileHandler => 3,
            ExtensionKind::ExportFormat => 4,
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExtensionKind {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExtensionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PluginError::InvalidInput(format!("unknown extension kind: {s}")))
    }
}

/// Permissions a plugin may declare in its manifest.
///
/// Declarations are informational; the host does not sandbox plugin code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "fs:read")]
    FsRead,
    #[serde(rename = "fs:write")]
    FsWrite,
    #[serde(rename = "network")]
    Network,
    #[serde(rename = "clipboard")]
    Clipboard,
    #[serde(rename = "notification")]
    Notification,
    #[serde(rename = "storage")]
    Storage,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FsRead => "fs:read",
            Permission::FsWrite => "fs:write",
            Permission::Network => "network",
            Permission::Clipboard => "clipboard",
            Permission::Notification => "notification",
            Permission::Storage => "storage",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
