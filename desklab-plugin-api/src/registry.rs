//! Extension registry - the shared table of everything plugins contribute
//!
//! One ordered id→descriptor list per [`ExtensionKind`]. Registration is
//! last-write-wins: re-registering an id replaces the descriptor in place
//! and keeps its original position.

use serde::Serialize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, warn};

use crate::error::PluginError;
use crate::extension::{
    Command, CommandContext, ContentKind, ExportContent, ExportFormat, ExportResult, Extension,
    FileHandleResult, FileHandler, FileInfo, SidebarPanel, ToolbarItem, ToolbarLocation,
    split_qualified,
};
use crate::listeners::{Listeners, Subscription};
use crate::types::ExtensionKind;

type Tables = [Vec<Extension>; 5];

/// Counts of registered extensions per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub toolbar: usize,
    pub sidebar: usize,
    pub commands: usize,
    pub file_handlers: usize,
    pub export_formats: usize,
    pub total: usize,
}

/// Registry of contributed extensions.
///
/// Listeners run synchronously after each mutation, once the lock is
/// released, so they can call back into the query methods.
#[derive(Default)]
pub struct ExtensionRegistry {
    tables: RwLock<Tables>,
    listeners: Listeners<()>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.listeners.notify(&());
    }

    // ─── Mutation ────────────────────────────────────────────────────

    /// Insert or replace an extension by id
    pub fn register(&self, extension: impl Into<Extension>) {
        let extension = extension.into();
        let kind = extension.kind();
        {
            let mut tables = self.write();
            let table = &mut tables[kind.index()];
            match table.iter_mut().find(|e| e.id() == extension.id()) {
                Some(existing) => {
                    debug!(kind = %kind, id = %extension.id(), "Replacing extension");
                    *existing = extension;
                }
                None => {
                    debug!(kind = %kind, id = %extension.id(), "Registered extension");
                    table.push(extension);
                }
            }
        }
        self.notify();
    }

    /// Remove an extension. Returns whether anything was removed.
    pub fn unregister(&self, kind: ExtensionKind, id: &str) -> bool {
        let removed = {
            let mut tables = self.write();
            let table = &mut tables[kind.index()];
            let before = table.len();
            table.retain(|e| e.id() != id);
            table.len() != before
        };
        if removed {
            debug!(kind = %kind, id, "Unregistered extension");
        }
        self.notify();
        removed
    }

    /// Remove every extension owned by `plugin_id`, across all kinds.
    ///
    /// Listeners are notified exactly once. Returns the number removed.
    pub fn clear_plugin(&self, plugin_id: &str) -> usize {
        let removed = {
            let mut tables = self.write();
            let mut removed = 0;
            for table in tables.iter_mut() {
                let before = table.len();
                table.retain(|e| !is_owned_by(e, plugin_id));
                removed += before - table.len();
            }
            removed
        };
        debug!(plugin = %plugin_id, removed, "Cleared plugin extensions");
        self.notify();
        removed
    }

    /// Subscribe to registry changes
    pub fn add_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.listeners.subscribe(move |_: &()| listener())
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// Snapshot of one kind, in registration order
    pub fn list(&self, kind: ExtensionKind) -> Vec<Extension> {
        self.read()[kind.index()].clone()
    }

    pub fn get(&self, kind: ExtensionKind, id: &str) -> Option<Extension> {
        self.read()[kind.index()]
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    /// Every extension owned by `plugin_id`, grouped by kind
    pub fn owned_by(&self, plugin_id: &str) -> Vec<Extension> {
        self.read()
            .iter()
            .flatten()
            .filter(|e| is_owned_by(e, plugin_id))
            .cloned()
            .collect()
    }

    fn collect<T>(&self, kind: ExtensionKind, pick: impl Fn(&Extension) -> Option<T>) -> Vec<T> {
        self.read()[kind.index()].iter().filter_map(pick).collect()
    }

    /// Toolbar items, optionally filtered by location.
    ///
    /// Items without a location match every filter.
    pub fn toolbar_items(&self, location: Option<ToolbarLocation>) -> Vec<ToolbarItem> {
        self.collect(ExtensionKind::Toolbar, |e| match e {
            Extension::Toolbar(item) if location.is_none_or(|l| item.shown_on(l)) => {
                Some(item.clone())
            }
            _ => None,
        })
    }

    pub fn sidebar_panels(&self) -> Vec<SidebarPanel> {
        self.collect(ExtensionKind::Sidebar, |e| match e {
            Extension::Sidebar(panel) => Some(panel.clone()),
            _ => None,
        })
    }

    pub fn commands(&self) -> Vec<Command> {
        self.collect(ExtensionKind::Command, |e| match e {
            Extension::Command(command) => Some(command.clone()),
            _ => None,
        })
    }

    pub fn command(&self, id: &str) -> Option<Command> {
        match self.get(ExtensionKind::Command, id)? {
            Extension::Command(command) => Some(command),
            _ => None,
        }
    }

    pub fn file_handlers(&self) -> Vec<FileHandler> {
        self.collect(ExtensionKind::FileHandler, |e| match e {
            Extension::FileHandler(handler) => Some(handler.clone()),
            _ => None,
        })
    }

    /// Export formats, optionally filtered by supported content kind
    pub fn export_formats(&self, supports: Option<ContentKind>) -> Vec<ExportFormat> {
        self.collect(ExtensionKind::ExportFormat, |e| match e {
            Extension::ExportFormat(format)
                if supports.is_none_or(|kind| format.supports_kind(kind)) =>
            {
                Some(format.clone())
            }
            _ => None,
        })
    }

    /// First registered handler for a file extension (case-insensitive).
    ///
    /// The leading dot is optional: `csv` and `.CSV` both work.
    pub fn find_file_handler(&self, extension: &str) -> Option<FileHandler> {
        self.read()[ExtensionKind::FileHandler.index()]
            .iter()
            .find_map(|e| match e {
                Extension::FileHandler(handler) if handler.handles(extension) => {
                    Some(handler.clone())
                }
                _ => None,
            })
    }

    pub fn stats(&self) -> RegistryStats {
        let tables = self.read();
        let count = |kind: ExtensionKind| tables[kind.index()].len();
        let stats = RegistryStats {
            toolbar: count(ExtensionKind::Toolbar),
            sidebar: count(ExtensionKind::Sidebar),
            commands: count(ExtensionKind::Command),
            file_handlers: count(ExtensionKind::FileHandler),
            export_formats: count(ExtensionKind::ExportFormat),
            total: 0,
        };
        RegistryStats {
            total: stats.toolbar
                + stats.sidebar
                + stats.commands
                + stats.file_handlers
                + stats.export_formats,
            ..stats
        }
    }

    // ─── Invocation ──────────────────────────────────────────────────

    /// Run a registered command.
    ///
    /// An unknown id is logged and treated as success. Handler failures are
    /// logged and returned.
    pub async fn execute_command(&self, id: &str, ctx: CommandContext) -> Result<(), PluginError> {
        let Some(command) = self.command(id) else {
            warn!(command = %id, "Command not found");
            return Ok(());
        };
        command.execute(ctx).await.inspect_err(|e| {
            error!(command = %id, error = %e, "Command failed");
        })
    }

    /// Run the first handler registered for the file's extension.
    ///
    /// Returns `Ok(None)` when no handler matches.
    pub async fn handle_file(&self, file: FileInfo) -> Result<Option<FileHandleResult>, PluginError> {
        let Some(handler) = file
            .extension()
            .and_then(|ext| self.find_file_handler(&ext))
        else {
            debug!(file = %file.name, "No file handler");
            return Ok(None);
        };
        handler.handle(file).await.map(Some).inspect_err(|e| {
            error!(handler = %handler.id, error = %e, "File handler failed");
        })
    }

    /// Run a registered export format
    pub async fn export(
        &self,
        format_id: &str,
        content: ExportContent,
    ) -> Result<ExportResult, PluginError> {
        let Some(Extension::ExportFormat(format)) = self.get(ExtensionKind::ExportFormat, format_id)
        else {
            return Err(PluginError::InvalidInput(format!(
                "unknown export format: {format_id}"
            )));
        };
        if !format.supports_kind(content.kind) {
            return Err(PluginError::InvalidInput(format!(
                "{} does not support {} content",
                format.name, content.kind
            )));
        }
        format.export(content).await.inspect_err(|e| {
            error!(format = %format_id, error = %e, "Export failed");
        })
    }

    /// Click a toolbar item. Returns false if it is unknown or disabled.
    pub fn click_toolbar_item(&self, id: &str) -> bool {
        match self.get(ExtensionKind::Toolbar, id) {
            Some(Extension::Toolbar(item)) if !item.disabled => {
                item.click();
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("stats", &self.stats())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// The owner is everything before the first `:` of a qualified id
fn is_owned_by(extension: &Extension, plugin_id: &str) -> bool {
    split_qualified(extension.id()).is_some_and(|(owner, _)| owner == plugin_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn toolbar(id: &str) -> ToolbarItem {
        ToolbarItem::new(id, id, "star", || {})
    }

    fn csv_handler(id: &str, extensions: &[&str]) -> FileHandler {
        let tag = id.to_string();
        FileHandler::new(id, id, extensions.iter().copied(), move |_file: FileInfo| {
            let tag = tag.clone();
            async move { Ok(FileHandleResult::text(tag)) }
        })
    }

    fn file(name: &str) -> FileInfo {
        FileInfo {
            name: name.to_string(),
            path: PathBuf::from(name),
            size: 0,
            mime_type: "text/csv".to_string(),
        }
    }

    #[test]
    fn test_register_overwrite_keeps_position() {
        let registry = ExtensionRegistry::new();
        registry.register(toolbar("p:a"));
        registry.register(toolbar("p:b"));
        registry.register(ToolbarItem::new("p:a", "Renamed", "star", || {}));

        let items = registry.toolbar_items(None);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["p:a", "p:b"]);
        assert_eq!(items[0].title, "Renamed");
    }

    #[test]
    fn test_same_local_id_from_two_plugins_coexists() {
        let registry = ExtensionRegistry::new();
        registry.register(toolbar("p1:x"));
        registry.register(toolbar("p2:x"));
        assert_eq!(registry.stats().toolbar, 2);
    }

    #[test]
    fn test_unregister_missing_is_not_an_error() {
        let registry = ExtensionRegistry::new();
        assert!(!registry.unregister(ExtensionKind::Command, "nope"));
        registry.register(toolbar("p:a"));
        assert!(registry.unregister(ExtensionKind::Toolbar, "p:a"));
        assert_eq!(registry.stats().total, 0);
    }

    #[test]
    fn test_toolbar_location_filter() {
        let registry = ExtensionRegistry::new();
        registry.register(toolbar("p:any"));
        registry.register(toolbar("p:editor").with_location(ToolbarLocation::Editor));
        registry.register(toolbar("p:canvas").with_location(ToolbarLocation::Canvas));

        let ids: Vec<String> = registry
            .toolbar_items(Some(ToolbarLocation::Editor))
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["p:any", "p:editor"]);
    }

    #[test]
    fn test_export_formats_filter_by_supported_kind() {
        let registry = ExtensionRegistry::new();
        let exporter = |_c: ExportContent| async { Ok(ExportResult::written("x")) };
        registry.register(ExportFormat::new(
            "p:md",
            "Markdown",
            "md",
            vec![ContentKind::Note],
            exporter,
        ));
        registry.register(ExportFormat::new(
            "p:png",
            "PNG",
            "png",
            vec![ContentKind::Canvas, ContentKind::Mindmap],
            exporter,
        ));

        assert_eq!(registry.export_formats(None).len(), 2);
        let formats = registry.export_formats(Some(ContentKind::Mindmap));
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].id, "p:png");
    }

    #[test]
    fn test_find_file_handler_first_registered_wins() {
        let registry = ExtensionRegistry::new();
        registry.register(csv_handler("p1:csv", &[".csv"]));
        registry.register(csv_handler("p2:csv", &[".CSV", ".tsv"]));

        assert_eq!(registry.find_file_handler(".CSV").unwrap().id, "p1:csv");
        assert_eq!(registry.find_file_handler("tsv").unwrap().id, "p2:csv");
        assert!(registry.find_file_handler(".xlsx").is_none());
    }

    #[tokio::test]
    async fn test_dotless_handler_extensions_match() {
        let registry = ExtensionRegistry::new();
        registry.register(csv_handler("p:csv", &["csv"]));

        assert_eq!(registry.find_file_handler(".CSV").unwrap().id, "p:csv");
        assert_eq!(registry.find_file_handler("csv").unwrap().id, "p:csv");
        let result = registry.handle_file(file("report.csv")).await.unwrap();
        assert_eq!(result, Some(FileHandleResult::text("p:csv")));
    }

    #[test]
    fn test_clear_plugin_removes_only_that_prefix_and_notifies_once() {
        let registry = ExtensionRegistry::new();
        registry.register(toolbar("p1:a"));
        registry.register(csv_handler("p1:csv", &[".csv"]));
        registry.register(toolbar("p10:a"));
        registry.register(toolbar("p2:a"));

        let notified = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&notified);
        let _sub = registry.add_listener(move || {
            n.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.clear_plugin("p1"), 2);
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        let ids: Vec<String> = registry.toolbar_items(None).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["p10:a", "p2:a"]);
        assert!(registry.owned_by("p1").is_empty());
    }

    #[test]
    fn test_listener_can_query_registry() {
        let registry = Arc::new(ExtensionRegistry::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let reg = Arc::clone(&registry);
        let s = Arc::clone(&seen);
        let sub = registry.add_listener(move || {
            s.store(reg.stats().total, Ordering::SeqCst);
        });

        registry.register(toolbar("p:a"));
        registry.register(toolbar("p:b"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        sub.unsubscribe();
        registry.register(toolbar("p:c"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_click_toolbar_item_respects_disabled() {
        let registry = ExtensionRegistry::new();
        let clicks = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&clicks);
        registry.register(ToolbarItem::new("p:go", "Go", "play_arrow", move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        registry.register(toolbar("p:off").with_disabled(true));

        assert!(registry.click_toolbar_item("p:go"));
        assert!(!registry.click_toolbar_item("p:off"));
        assert!(!registry.click_toolbar_item("p:missing"));
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_missing_command_is_ok() {
        let registry = ExtensionRegistry::new();
        registry
            .execute_command("nope:cmd", CommandContext::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_execute_command_propagates_handler_error() {
        let registry = ExtensionRegistry::new();
        registry.register(Command::new("p:fail", "Fail", |_ctx: CommandContext| async {
            Err(PluginError::handler("nope"))
        }));

        let err = registry
            .execute_command("p:fail", CommandContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::Handler(_)));
        assert_eq!(registry.stats().commands, 1);
    }

    #[tokio::test]
    async fn test_handle_file_dispatches_by_extension() {
        let registry = ExtensionRegistry::new();
        registry.register(csv_handler("p1:csv", &[".csv"]));

        let result = registry.handle_file(file("data.CSV")).await.unwrap();
        assert_eq!(result, Some(FileHandleResult::text("p1:csv")));
        assert_eq!(registry.handle_file(file("data.bin")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_export_rejects_unknown_and_unsupported() {
        let registry = ExtensionRegistry::new();
        registry.register(ExportFormat::new(
            "p:md",
            "Markdown",
            "md",
            vec![ContentKind::Note],
            |c: ExportContent| async move { Ok(ExportResult::written(c.title)) },
        ));
        let content = |kind| ExportContent {
            kind,
            id: "1".into(),
            title: "t".into(),
            data: serde_json::Value::Null,
        };

        assert!(registry.export("p:pdf", content(ContentKind::Note)).await.is_err());
        assert!(registry.export("p:md", content(ContentKind::Ppt)).await.is_err());
        let result = registry.export("p:md", content(ContentKind::Note)).await.unwrap();
        assert_eq!(result.output.as_deref(), Some("t"));
    }
}
