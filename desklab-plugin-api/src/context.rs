//! Plugin context - the capability surface handed to `Plugin::activate`

use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::extension::{
    Command, ExportFormat, Extension, FileHandler, SidebarPanel, ToolbarItem, qualify,
};
use crate::interaction::{
    ConfirmPrompt, NotificationBus, NotificationKind, PluginNotification, confirm_text,
};
use crate::registry::ExtensionRegistry;
use crate::storage::{KeyValueStore, PluginStorage};
use crate::types::{ExtensionKind, Permission};

/// Builds a fresh [`PluginContext`] for each activation.
///
/// All contexts created for the same plugin id share one registry and one
/// storage namespace.
#[derive(Clone)]
pub struct ContextFactory {
    registry: Arc<ExtensionRegistry>,
    store: Arc<dyn KeyValueStore>,
    notifications: NotificationBus,
    confirm: Arc<dyn ConfirmPrompt>,
}

impl ContextFactory {
    pub fn new(
        registry: Arc<ExtensionRegistry>,
        store: Arc<dyn KeyValueStore>,
        notifications: NotificationBus,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        Self {
            registry,
            store,
            notifications,
            confirm,
        }
    }

    pub fn create(&self, plugin_id: &str) -> PluginContext {
        PluginContext {
            plugin_id: plugin_id.to_string(),
            registry: Arc::clone(&self.registry),
            storage: PluginStorage::new(plugin_id, Arc::clone(&self.store)),
            notifications: self.notifications.clone(),
            confirm: Arc::clone(&self.confirm),
            permissions: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.notifications
    }
}

impl std::fmt::Debug for ContextFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextFactory")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Context passed to a plugin when it activates.
///
/// Everything registered through the context is qualified with the plugin id,
/// so local ids only have to be unique within one plugin.
#[derive(Clone)]
pub struct PluginContext {
    plugin_id: String,
    registry: Arc<ExtensionRegistry>,
    storage: PluginStorage,
    notifications: NotificationBus,
    confirm: Arc<dyn ConfirmPrompt>,
    permissions: Vec<Permission>,
}

impl PluginContext {
    /// Attach the manifest's declared permissions
    pub fn with_permissions(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Declared permissions. Informational only; nothing is enforced.
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    // ─── Registration ────────────────────────────────────────────────

    /// Register any extension under this plugin's namespace
    pub fn register(&self, extension: impl Into<Extension>) -> Disposable {
        let mut extension = extension.into();
        let kind = extension.kind();
        let id = qualify(&self.plugin_id, extension.id());
        extension.set_id(id.clone());
        self.registry.register(extension);
        Disposable::new(Arc::clone(&self.registry), kind, id)
    }

    pub fn register_toolbar_item(&self, item: ToolbarItem) -> Disposable {
        self.register(item)
    }

    pub fn register_sidebar_panel(&self, panel: SidebarPanel) -> Disposable {
        self.register(panel)
    }

    pub fn register_command(&self, command: Command) -> Disposable {
        self.register(command)
    }

    pub fn register_file_handler(&self, handler: FileHandler) -> Disposable {
        self.register(handler)
    }

    pub fn register_export_format(&self, format: ExportFormat) -> Disposable {
        self.register(format)
    }

    // ─── Storage ─────────────────────────────────────────────────────

    pub fn storage(&self) -> &PluginStorage {
        &self.storage
    }

    // ─── UI ──────────────────────────────────────────────────────────

    /// Publish a notification (defaults to info)
    pub fn show_notification(&self, message: impl Into<String>, kind: Option<NotificationKind>) {
        let notification = PluginNotification {
            message: message.into(),
            kind: kind.unwrap_or_default(),
            plugin_id: self.plugin_id.clone(),
            timestamp: Utc::now(),
        };
        tracing::debug!(
            plugin = %self.plugin_id,
            kind = notification.kind.as_str(),
            "{}",
            notification.message
        );
        self.notifications.publish(notification);
    }

    /// Ask the user to confirm. Suspends until the prompt answers.
    pub async fn show_confirm(&self, message: &str, title: Option<&str>) -> bool {
        self.confirm.confirm(&confirm_text(message, title)).await
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log an info message tagged with the plugin id
    pub fn log_info(&self, message: &str) {
        tracing::info!(plugin = %self.plugin_id, "{}", message);
    }

    pub fn log_warn(&self, message: &str) {
        tracing::warn!(plugin = %self.plugin_id, "{}", message);
    }

    pub fn log_error(&self, message: &str) {
        tracing::error!(plugin = %self.plugin_id, "{}", message);
    }

    pub fn log_debug(&self, message: &str) {
        tracing::debug!(plugin = %self.plugin_id, "{}", message);
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("plugin_id", &self.plugin_id)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

/// Revokes one registration.
///
/// Only [`Disposable::dispose`] removes the extension; dropping the handle
/// leaves it registered. Disposing twice is a no-op.
pub struct Disposable {
    registry: Arc<ExtensionRegistry>,
    kind: ExtensionKind,
    id: String,
    disposed: AtomicBool,
}

impl Disposable {
    fn new(registry: Arc<ExtensionRegistry>, kind: ExtensionKind, id: String) -> Self {
        Self {
            registry,
            kind,
            id,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.registry.unregister(self.kind, &self.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// The qualified id this handle is bound to
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposable")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
