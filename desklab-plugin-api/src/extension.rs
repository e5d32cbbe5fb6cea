//! Extension descriptors - what plugins contribute to the host
//!
//! Each contribution kind has its own descriptor type. The closed
//! [`Extension`] enum wraps them so the registry can store, qualify, and
//! clear every kind through one code path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::PluginError;
use crate::types::ExtensionKind;

/// Build a fully-qualified extension id: `<plugin_id>:<local_id>`
pub fn qualify(plugin_id: &str, local_id: &str) -> String {
    format!("{plugin_id}:{local_id}")
}

/// Split a qualified id into `(plugin_id, local_id)` at the first `:`
pub fn split_qualified(id: &str) -> Option<(&str, &str)> {
    id.split_once(':')
}

// ─── Shared enums ────────────────────────────────────────────────────

/// UI surface a toolbar item is shown on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolbarLocation {
    Editor,
    Canvas,
    Mindmap,
    Ppt,
}

/// Where a sidebar panel docks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelPosition {
    Top,
    Bottom,
}

/// Content kinds that can be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Note,
    Canvas,
    Mindmap,
    Ppt,
}

macro_rules! lowercase_enum_str {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = PluginError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(PluginError::InvalidInput(format!(
                        "unknown {}: {}",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

lowercase_enum_str!(ToolbarLocation {
    Editor => "editor",
    Canvas => "canvas",
    Mindmap => "mindmap",
    Ppt => "ppt",
});

lowercase_enum_str!(PanelPosition {
    Top => "top",
    Bottom => "bottom",
});

lowercase_enum_str!(ContentKind {
    Note => "note",
    Canvas => "canvas",
    Mindmap => "mindmap",
    Ppt => "ppt",
});

// ─── Handler traits ──────────────────────────────────────────────────

/// Toolbar click callback
pub type ClickHandler = Arc<dyn Fn() + Send + Sync>;

/// Sidebar renderer: turns panel props into a view description for the UI layer
pub type PanelRenderer = Arc<dyn Fn(&SidebarPanelProps) -> serde_json::Value + Send + Sync>;

/// Async command handler.
///
/// Implemented for any `Fn(CommandContext) -> impl Future` closure.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(&self, ctx: CommandContext) -> Result<(), PluginError>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), PluginError>> + Send + 'static,
{
    async fn call(&self, ctx: CommandContext) -> Result<(), PluginError> {
        self(ctx).await
    }
}

/// Async file processor backing a [`FileHandler`]
#[async_trait]
pub trait FileProcessor: Send + Sync {
    async fn handle(&self, file: FileInfo) -> Result<FileHandleResult, PluginError>;
}

#[async_trait]
impl<F, Fut> FileProcessor for F
where
    F: Fn(FileInfo) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FileHandleResult, PluginError>> + Send + 'static,
{
    async fn handle(&self, file: FileInfo) -> Result<FileHandleResult, PluginError> {
        self(file).await
    }
}

/// Async exporter backing an [`ExportFormat`]
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, content: ExportContent) -> Result<ExportResult, PluginError>;
}

#[async_trait]
impl<F, Fut> Exporter for F
where
    F: Fn(ExportContent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ExportResult, PluginError>> + Send + 'static,
{
    async fn export(&self, content: ExportContent) -> Result<ExportResult, PluginError> {
        self(content).await
    }
}

// ─── Toolbar ─────────────────────────────────────────────────────────

/// A button contributed to one of the application toolbars
#[derive(Clone)]
pub struct ToolbarItem {
    pub id: String,
    pub title: String,
    /// Icon name (Material Icons)
    pub icon: String,
    pub on_click: ClickHandler,
    pub disabled: bool,
    pub tooltip: Option<String>,
    /// `None` shows the item on every toolbar
    pub location: Option<ToolbarLocation>,
}

impl ToolbarItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        icon: impl Into<String>,
        on_click: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            icon: icon.into(),
            on_click: Arc::new(on_click),
            disabled: false,
            tooltip: None,
            location: None,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn with_location(mut self, location: ToolbarLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Whether the item is shown on the given toolbar
    pub fn shown_on(&self, location: ToolbarLocation) -> bool {
        self.location.is_none_or(|l| l == location)
    }

    pub fn click(&self) {
        (self.on_click)();
    }
}

impl fmt::Debug for ToolbarItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolbarItem")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("icon", &self.icon)
            .field("disabled", &self.disabled)
            .field("tooltip", &self.tooltip)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

// ─── Sidebar ─────────────────────────────────────────────────────────

/// Props handed to a sidebar renderer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidebarPanelProps {
    pub project_id: Option<String>,
}

/// A panel contributed to the sidebar
#[derive(Clone)]
pub struct SidebarPanel {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub renderer: PanelRenderer,
    pub position: Option<PanelPosition>,
}

impl SidebarPanel {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        icon: impl Into<String>,
        renderer: impl Fn(&SidebarPanelProps) -> serde_json::Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            icon: icon.into(),
            renderer: Arc::new(renderer),
            position: None,
        }
    }

    pub fn with_position(mut self, position: PanelPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn render(&self, props: &SidebarPanelProps) -> serde_json::Value {
        (self.renderer)(props)
    }
}

impl fmt::Debug for SidebarPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SidebarPanel")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("icon", &self.icon)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

// ─── Commands ────────────────────────────────────────────────────────

/// Context a command runs in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandContext {
    /// Current project, if any
    pub project_id: Option<String>,
    /// Current selection payload, if any
    pub selection: Option<serde_json::Value>,
}

impl CommandContext {
    /// The selection as text, when it is a non-empty string
    pub fn selection_text(&self) -> Option<&str> {
        self.selection
            .as_ref()
            .and_then(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// A named command with an async handler
#[derive(Clone)]
pub struct Command {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// e.g. `Ctrl+Shift+W`
    pub keybinding: Option<String>,
    pub handler: Arc<dyn CommandHandler>,
}

impl Command {
    pub fn new<F, Fut>(id: impl Into<String>, title: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PluginError>> + Send + 'static,
    {
        Self::from_handler(id, title, Arc::new(handler))
    }

    /// Build from a [`CommandHandler`] implementation
    pub fn from_handler(
        id: impl Into<String>,
        title: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            keybinding: None,
            handler,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keybinding(mut self, keybinding: impl Into<String>) -> Self {
        self.keybinding = Some(keybinding.into());
        self
    }

    pub async fn execute(&self, ctx: CommandContext) -> Result<(), PluginError> {
        self.handler.call(ctx).await
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("keybinding", &self.keybinding)
            .finish_non_exhaustive()
    }
}

// ─── File handlers ───────────────────────────────────────────────────

/// A file offered to a file handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub mime_type: String,
}

impl FileInfo {
    /// Describe a file on disk
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
        Ok(Self {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
            mime_type,
        })
    }

    /// The file's extension with a leading dot (e.g. `.csv`), if it has one
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .or_else(|| Path::new(&self.name).extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
    }
}

/// Outcome of handling a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileHandleResult {
    pub success: bool,
    /// Extracted text content
    pub text_content: Option<String>,
    /// Generated thumbnail path
    pub thumbnail_path: Option<String>,
    pub error: Option<String>,
}

impl FileHandleResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text_content: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// A handler for one or more file extensions
#[derive(Clone)]
pub struct FileHandler {
    pub id: String,
    /// Extensions, usually with a leading dot, e.g. `[".csv", ".xlsx"]`
    pub extensions: Vec<String>,
    pub mime_types: Vec<String>,
    pub name: String,
    pub processor: Arc<dyn FileProcessor>,
}

impl FileHandler {
    pub fn new<I, S, F, Fut>(
        id: impl Into<String>,
        name: impl Into<String>,
        extensions: I,
        processor: F,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(FileInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FileHandleResult, PluginError>> + Send + 'static,
    {
        Self::from_processor(id, name, extensions, Arc::new(processor))
    }

    /// Build from a [`FileProcessor`] implementation
    pub fn from_processor<I, S>(
        id: impl Into<String>,
        name: impl Into<String>,
        extensions: I,
        processor: Arc<dyn FileProcessor>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            mime_types: Vec::new(),
            name: name.into(),
            processor,
        }
    }

    pub fn with_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_types = mime_types.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive extension match. A leading dot is ignored on both
    /// sides, so `csv` and `.CSV` are the same extension.
    pub fn handles(&self, extension: &str) -> bool {
        let wanted = extension.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(wanted))
    }

    pub async fn handle(&self, file: FileInfo) -> Result<FileHandleResult, PluginError> {
        self.processor.handle(file).await
    }
}

impl fmt::Debug for FileHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandler")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .field("mime_types", &self.mime_types)
            .finish_non_exhaustive()
    }
}

// ─── Export formats ──────────────────────────────────────────────────

/// Content handed to an exporter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportContent {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub id: String,
    pub title: String,
    pub data: serde_json::Value,
}

/// Outcome of an export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    pub success: bool,
    /// Path of the written file
    pub output: Option<String>,
    pub error: Option<String>,
}

impl ExportResult {
    pub fn written(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// An export target format
#[derive(Clone)]
pub struct ExportFormat {
    pub id: String,
    pub name: String,
    /// File extension of the output, e.g. `md`
    pub extension: String,
    pub description: Option<String>,
    pub supports: Vec<ContentKind>,
    pub exporter: Arc<dyn Exporter>,
}

impl ExportFormat {
    pub fn new<F, Fut>(
        id: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
        supports: Vec<ContentKind>,
        exporter: F,
    ) -> Self
    where
        F: Fn(ExportContent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ExportResult, PluginError>> + Send + 'static,
    {
        Self::from_exporter(id, name, extension, supports, Arc::new(exporter))
    }

    /// Build from an [`Exporter`] implementation
    pub fn from_exporter(
        id: impl Into<String>,
        name: impl Into<String>,
        extension: impl Into<String>,
        supports: Vec<ContentKind>,
        exporter: Arc<dyn Exporter>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extension: extension.into(),
            description: None,
            supports,
            exporter,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn supports_kind(&self, kind: ContentKind) -> bool {
        self.supports.contains(&kind)
    }

    pub async fn export(&self, content: ExportContent) -> Result<ExportResult, PluginError> {
        self.exporter.export(content).await
    }
}

impl fmt::Debug for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportFormat")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field("description", &self.description)
            .field("supports", &self.supports)
            .finish_non_exhaustive()
    }
}

// ─── Extension ───────────────────────────────────────────────────────

/// Any contribution a plugin can register
#[derive(Debug, Clone)]
pub enum Extension {
    Toolbar(ToolbarItem),
    Sidebar(SidebarPanel),
    Command(Command),
    FileHandler(FileHandler),
    ExportFormat(ExportFormat),
}

impl Extension {
    pub fn kind(&self) -> ExtensionKind {
        match self {
            Extension::Toolbar(_) => ExtensionKind::Toolbar,
            Extension::Sidebar(_) => ExtensionKind::Sidebar,
            Extension::Command(_) => ExtensionKind::Command,
            Extension::FileHandler(_) => ExtensionKind::FileHandler,
            Extension::ExportFormat(_) => ExtensionKind::ExportFormat,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Extension::Toolbar(item) => &item.id,
            Extension::Sidebar(panel) => &panel.id,
            Extension::Command(command) => &command.id,
            Extension::FileHandler(handler) => &handler.id,
            Extension::ExportFormat(format) => &format.id,
        }
    }

    /// Human-readable label (title or name)
    pub fn label(&self) -> &str {
        match self {
            Extension::Toolbar(item) => &item.title,
            Extension::Sidebar(panel) => &panel.title,
            Extension::Command(command) => &command.title,
            Extension::FileHandler(handler) => &handler.name,
            Extension::ExportFormat(format) => &format.name,
        }
    }

    pub(crate) fn set_id(&mut self, id: String) {
        match self {
            Extension::Toolbar(item) => item.id = id,
            Extension::Sidebar(panel) => panel.id = id,
            Extension::Command(command) => command.id = id,
            Extension::FileHandler(handler) => handler.id = id,
            Extension::ExportFormat(format) => format.id = id,
        }
    }
}

impl From<ToolbarItem> for Extension {
    fn from(item: ToolbarItem) -> Self {
        Extension::Toolbar(item)
    }
}

impl From<SidebarPanel> for Extension {
    fn from(panel: SidebarPanel) -> Self {
        Extension::Sidebar(panel)
    }
}

impl From<Command> for Extension {
    fn from(command: Command) -> Self {
        Extension::Command(command)
    }
}

impl From<FileHandler> for Extension {
    fn from(handler: FileHandler) -> Self {
        Extension::FileHandler(handler)
    }
}

impl From<ExportFormat> for Extension {
    fn from(format: ExportFormat) -> Self {
        Extension::ExportFormat(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_qualify_and_split() {
        let id = qualify("builtin.word-count", "showWordCount");
        assert_eq!(id, "builtin.word-count:showWordCount");
        assert_eq!(
            split_qualified(&id),
            Some(("builtin.word-count", "showWordCount"))
        );
        assert_eq!(split_qualified("unqualified"), None);
    }

    #[test]
    fn test_toolbar_item_without_location_is_shown_everywhere() {
        let item = ToolbarItem::new("a", "A", "add", || {});
        assert!(item.shown_on(ToolbarLocation::Editor));
        assert!(item.shown_on(ToolbarLocation::Ppt));

        let item = item.with_location(ToolbarLocation::Canvas);
        assert!(item.shown_on(ToolbarLocation::Canvas));
        assert!(!item.shown_on(ToolbarLocation::Editor));
    }

    #[test]
    fn test_toolbar_click_invokes_handler() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        let item = ToolbarItem::new("a", "A", "add", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        item.click();
        item.clone().click();
        assert_eq!(clicks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_file_handler_matches_case_insensitively() {
        let handler = FileHandler::new("csv", "CSV", [".csv", ".TSV"], |_file: FileInfo| async {
            Ok(FileHandleResult::text(""))
        });
        assert!(handler.handles(".CSV"));
        assert!(handler.handles(".tsv"));
        assert!(!handler.handles(".xlsx"));
    }

    #[test]
    fn test_file_info_extension() {
        let info = FileInfo {
            name: "data.CSV".into(),
            path: PathBuf::from("/tmp/data.CSV"),
            size: 0,
            mime_type: "text/csv".into(),
        };
        assert_eq!(info.extension().as_deref(), Some(".CSV"));
    }

    #[test]
    fn test_file_info_from_path() {
        let dir = std::env::temp_dir().join(format!("desklab-fileinfo-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("notes.txt");
        std::fs::write(&path, "# hi").unwrap();

        let info = FileInfo::from_path(&path).unwrap();
        assert_eq!(info.name, "notes.txt");
        assert_eq!(info.size, 4);
        assert_eq!(info.mime_type, "text/plain");

        let image = dir.join("diagram.svg");
        std::fs::write(&image, "<svg/>").unwrap();
        assert_eq!(FileInfo::from_path(&image).unwrap().mime_type, "image/svg+xml");

        let unknown = dir.join("blob.desklab-unknown");
        std::fs::write(&unknown, "").unwrap();
        assert_eq!(
            FileInfo::from_path(&unknown).unwrap().mime_type,
            "application/octet-stream"
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_command_closure_handler_runs() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let command = Command::new("count", "Count", move |ctx: CommandContext| {
            let counter = Arc::clone(&counter);
            async move {
                if ctx.project_id.is_some() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }
        });

        command
            .execute(CommandContext {
                project_id: Some("p1".into()),
                selection: None,
            })
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_command_from_handler_impl() {
        struct Counter(AtomicUsize);

        #[async_trait]
        impl CommandHandler for Counter {
            async fn call(&self, _ctx: CommandContext) -> Result<(), PluginError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let command = Command::from_handler("count", "Count", counter.clone());
        command.execute(CommandContext::default()).await.unwrap();
        command.execute(CommandContext::default()).await.unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_export_format_closure_exporter() {
        let format = ExportFormat::new(
            "md",
            "Markdown",
            "md",
            vec![ContentKind::Note],
            |content: ExportContent| async move { Ok(ExportResult::written(content.title)) },
        );
        assert!(format.supports_kind(ContentKind::Note));
        assert!(!format.supports_kind(ContentKind::Ppt));

        let result = format
            .export(ExportContent {
                kind: ContentKind::Note,
                id: "n1".into(),
                title: "out.md".into(),
                data: serde_json::Value::Null,
            })
            .await
            .unwrap();
        assert_eq!(result, ExportResult::written("out.md"));
    }

    #[test]
    fn test_selection_text_ignores_empty_and_non_strings() {
        let mut ctx = CommandContext::default();
        assert_eq!(ctx.selection_text(), None);
        ctx.selection = Some(serde_json::json!(""));
        assert_eq!(ctx.selection_text(), None);
        ctx.selection = Some(serde_json::json!({"nodes": 3}));
        assert_eq!(ctx.selection_text(), None);
        ctx.selection = Some(serde_json::json!("hello"));
        assert_eq!(ctx.selection_text(), Some("hello"));
    }

    #[test]
    fn test_extension_id_and_kind() {
        let mut ext: Extension = SidebarPanel::new("outline", "Outline", "list", |_props| {
            serde_json::json!({})
        })
        .into();
        assert_eq!(ext.kind(), ExtensionKind::Sidebar);
        ext.set_id(qualify("p", "outline"));
        assert_eq!(ext.id(), "p:outline");
        assert_eq!(ext.label(), "Outline");
    }

    #[test]
    fn test_content_kind_parse() {
        assert_eq!("Note".parse::<ContentKind>().unwrap(), ContentKind::Note);
        assert!("video".parse::<ContentKind>().is_err());
        assert_eq!(
            "canvas".parse::<ToolbarLocation>().unwrap(),
            ToolbarLocation::Canvas
        );
    }

    #[test]
    fn test_export_content_uses_type_field_on_the_wire() {
        let content = ExportContent {
            kind: ContentKind::Mindmap,
            id: "m".into(),
            title: "Map".into(),
            data: serde_json::Value::Null,
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "mindmap");
    }
}
