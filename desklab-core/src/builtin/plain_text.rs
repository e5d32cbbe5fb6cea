//! Plain text - opens `.txt`/`.md` files and exports notes as Markdown

use async_trait::async_trait;
use std::path::PathBuf;

use desklab_plugin_api::{
    ContentKind, ExportContent, ExportFormat, ExportResult, ExtensionKind, FileHandleResult,
    FileHandler, FileInfo, Permission, Plugin, PluginContext, PluginError, PluginManifest,
};

pub const PLUGIN_ID: &str = "builtin.plain-text";

pub fn manifest() -> PluginManifest {
    PluginManifest {
        version: "1.0.0".to_string(),
        description: "Reads plain text files and exports notes as Markdown".to_string(),
        author: Some("DeskLab".to_string()),
        extension_points: vec![ExtensionKind::FileHandler, ExtensionKind::ExportFormat],
        permissions: vec![Permission::FsRead, Permission::FsWrite],
        ..PluginManifest::new(PLUGIN_ID, "Plain Text")
    }
}

async fn read_text(file: FileInfo) -> Result<FileHandleResult, PluginError> {
    match tokio::fs::read_to_string(&file.path).await {
        Ok(text) => Ok(FileHandleResult::text(text)),
        Err(e) => Ok(FileHandleResult::failed(format!(
            "{}: {}",
            file.path.display(),
            e
        ))),
    }
}

/// Render a note as Markdown: the title as a heading, then the body
pub fn render_markdown(title: &str, body: &str) -> String {
    let body = body.trim_end();
    if body.is_empty() {
        format!("# {title}\n")
    } else {
        format!("# {title}\n\n{body}\n")
    }
}

/// Export a note. `data` carries `body` (text) and `path` (output file).
async fn export_markdown(content: ExportContent) -> Result<ExportResult, PluginError> {
    let Some(path) = content.data.get("path").and_then(|p| p.as_str()) else {
        return Ok(ExportResult::failed("missing target path"));
    };
    let body = content
        .data
        .get("body")
        .and_then(|b| b.as_str())
        .unwrap_or_default();

    let path = PathBuf::from(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, render_markdown(&content.title, body)).await?;
    Ok(ExportResult::written(path.display().to_string()))
}

/// Stateless: all registrations are cleared by the host on deactivation
pub struct PlainTextPlugin;

#[async_trait]
impl Plugin for PlainTextPlugin {
    async fn activate(&self, ctx: PluginContext) -> Result<(), PluginError> {
        ctx.register_file_handler(
            FileHandler::new("plainText", "Plain Text", [".txt", ".md"], read_text)
                .with_mime_types(["text/plain", "text/markdown"]),
        );
        ctx.register_export_format(
            ExportFormat::new(
                "markdown",
                "Markdown",
                "md",
                vec![ContentKind::Note],
                export_markdown,
            )
            .with_description("Note title and body as a Markdown file"),
        );
        Ok(())
    }
}
