//! Extension commands: list contributions and invoke them

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::console::style;
use std::path::PathBuf;
use tokio::sync::broadcast::{Receiver, error::TryRecvError};

use desklab_core::ExtensionHost;
use desklab_plugin_api::{
    CommandContext, ContentKind, ExportContent, ExtensionKind, ExtensionRegistry, FileInfo,
    NotificationKind, PluginNotification, ToolbarLocation,
};

use super::{HostOptions, open_host};

/// Extension arguments
#[derive(Args)]
pub struct ExtArgs {
    #[command(subcommand)]
    pub command: ExtCommands,
}

/// Extension subcommands
#[derive(Subcommand)]
pub enum ExtCommands {
    /// List registered extensions
    List {
        /// Only this kind (toolbar, sidebar, command, fileHandler, exportFormat)
        #[arg(long)]
        kind: Option<ExtensionKind>,
        /// Only toolbar items shown at this location
        #[arg(long)]
        location: Option<ToolbarLocation>,
        /// Only export formats supporting this content kind
        #[arg(long)]
        supports: Option<ContentKind>,
    },
    /// Execute a command by its qualified id
    Run {
        /// Command id, e.g. builtin.word-count:showWordCount
        id: String,
        /// Current project id
        #[arg(long)]
        project: Option<String>,
        /// Selected text handed to the command
        #[arg(long)]
        selection: Option<String>,
    },
    /// Click a toolbar item
    Click {
        /// Toolbar item id
        id: String,
    },
    /// Open a file with the first matching file handler
    Open {
        /// File to open
        path: PathBuf,
    },
    /// Export content with an export format
    Export {
        /// Export format id, e.g. builtin.plain-text:markdown
        format: String,
        /// Content title
        #[arg(long)]
        title: String,
        /// Content body
        #[arg(long, default_value = "")]
        body: String,
        /// Output file
        #[arg(long)]
        out: PathBuf,
        /// Content kind
        #[arg(long, default_value = "note")]
        kind: ContentKind,
    },
}

/// Run extension command
pub async fn run(args: ExtArgs, options: HostOptions) -> Result<()> {
    let host = open_host(options).await?;

    let result = match args.command {
        ExtCommands::List {
            kind,
            location,
            supports,
        } => {
            let filter = ExtensionFilter {
                kind,
                location,
                supports,
            };
            list_extensions(host.registry(), &filter);
            Ok(())
        }
        ExtCommands::Run {
            id,
            project,
            selection,
        } => run_command(&host, &id, project, selection).await,
        ExtCommands::Click { id } => click_item(&host, &id),
        ExtCommands::Open { path } => open_file(&host, path).await,
        ExtCommands::Export {
            format,
            title,
            body,
            out,
            kind,
        } => export_content(&host, &format, kind, title, body, out).await,
    };

    host.shutdown().await;
    result
}

/// Narrows `ext list` output; filters combine as an intersection
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionFilter {
    pub kind: Option<ExtensionKind>,
    pub location: Option<ToolbarLocation>,
    pub supports: Option<ContentKind>,
}

impl ExtensionFilter {
    fn kinds(&self) -> Vec<ExtensionKind> {
        ExtensionKind::ALL
            .into_iter()
            .filter(|k| self.kind.is_none_or(|wanted| wanted == *k))
            .filter(|k| self.location.is_none() || *k == ExtensionKind::Toolbar)
            .filter(|k| self.supports.is_none() || *k == ExtensionKind::ExportFormat)
            .collect()
    }
}

/// One line of `ext list`
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionRow {
    pub kind: ExtensionKind,
    pub id: String,
    pub title: String,
    pub details: String,
}

fn joined(parts: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    parts
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn extension_rows(registry: &ExtensionRegistry, filter: &ExtensionFilter) -> Vec<ExtensionRow> {
    let mut rows = Vec::new();

    for kind in filter.kinds() {
        match kind {
            ExtensionKind::Toolbar => {
                for item in registry.toolbar_items(filter.location) {
                    let mut details = item
                        .location
                        .map_or("everywhere", |l| l.as_str())
                        .to_string();
                    if item.disabled {
                        details.push_str(" (disabled)");
                    }
                    rows.push(ExtensionRow {
                        kind,
                        id: item.id,
                        title: item.title,
                        details,
                    });
                }
            }
            ExtensionKind::Sidebar => {
                for panel in registry.sidebar_panels() {
                    rows.push(ExtensionRow {
                        kind,
                        id: panel.id,
                        title: panel.title,
                        details: panel.position.map_or("top", |p| p.as_str()).to_string(),
                    });
                }
            }
            ExtensionKind::Command => {
                for command in registry.commands() {
                    rows.push(ExtensionRow {
                        kind,
                        id: command.id,
                        title: command.title,
                        details: command.keybinding.unwrap_or_default(),
                    });
                }
            }
            ExtensionKind::FileHandler => {
                for handler in registry.file_handlers() {
                    rows.push(ExtensionRow {
                        kind,
                        id: handler.id,
                        title: handler.name,
                        details: joined(&handler.extensions),
                    });
                }
            }
            ExtensionKind::ExportFormat => {
                for format in registry.export_formats(filter.supports) {
                    let supports = joined(format.supports.iter().map(|k| k.as_str()));
                    rows.push(ExtensionRow {
                        kind,
                        id: format.id,
                        title: format.name,
                        details: format!(".{} for {}", format.extension, supports),
                    });
                }
            }
        }
    }
    rows
}

fn list_extensions(registry: &ExtensionRegistry, filter: &ExtensionFilter) {
    let rows = extension_rows(registry, filter);
    if rows.is_empty() {
        println!("No extensions registered");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Kind").fg(Color::Cyan),
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("Title").fg(Color::Cyan),
            Cell::new("Details").fg(Color::Cyan),
        ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.kind.as_str()),
            Cell::new(row.id),
            Cell::new(row.title),
            Cell::new(row.details),
        ]);
    }
    println!("{table}");
}

/// Everything already sitting in the receiver
fn drain(rx: &mut Receiver<PluginNotification>) -> Vec<PluginNotification> {
    let mut notifications = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(notification) => notifications.push(notification),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Dropped notifications");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    notifications
}

fn print_notifications(rx: &mut Receiver<PluginNotification>) {
    for notification in drain(rx) {
        let label = match notification.kind {
            NotificationKind::Info => style("info").cyan(),
            NotificationKind::Success => style("success").green(),
            NotificationKind::Warning => style("warning").yellow(),
            NotificationKind::Error => style("error").red(),
        };
        println!(
            "[{}] {} {}",
            label,
            style(&notification.plugin_id).dim(),
            notification.message
        );
    }
}

async fn run_command(
    host: &ExtensionHost,
    id: &str,
    project: Option<String>,
    selection: Option<String>,
) -> Result<()> {
    if host.registry().command(id).is_none() {
        println!("Command '{}' not found", id);
        return Ok(());
    }

    let mut rx = host.notifications().subscribe();
    let ctx = CommandContext {
        project_id: project,
        selection: selection.map(serde_json::Value::String),
    };
    let result = host.registry().execute_command(id, ctx).await;
    print_notifications(&mut rx);
    result?;
    Ok(())
}

fn click_item(host: &ExtensionHost, id: &str) -> Result<()> {
    let mut rx = host.notifications().subscribe();
    if !host.registry().click_toolbar_item(id) {
        println!("Toolbar item '{}' not found or disabled", id);
        return Ok(());
    }
    print_notifications(&mut rx);
    Ok(())
}

async fn open_file(host: &ExtensionHost, path: PathBuf) -> Result<()> {
    let file = FileInfo::from_path(&path)?;
    let Some(result) = host.registry().handle_file(file).await? else {
        println!("No file handler for {}", path.display());
        return Ok(());
    };

    if !result.success {
        bail!(
            "Failed to open {}: {}",
            path.display(),
            result.error.unwrap_or_default()
        );
    }
    if let Some(text) = result.text_content {
        println!("{text}");
    }
    if let Some(thumbnail) = result.thumbnail_path {
        println!("Thumbnail: {thumbnail}");
    }
    Ok(())
}

async fn export_content(
    host: &ExtensionHost,
    format: &str,
    kind: ContentKind,
    title: String,
    body: String,
    out: PathBuf,
) -> Result<()> {
    let content = ExportContent {
        kind,
        id: out.display().to_string(),
        title,
        data: serde_json::json!({ "body": body, "path": out }),
    };

    let result = host.registry().export(format, content).await?;
    if !result.success {
        bail!("Export failed: {}", result.error.unwrap_or_default());
    }
    println!(
        "Exported to {}",
        result.output.unwrap_or_else(|| out.display().to_string())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use desklab_core::{HostConfig, builtin_plugins};
    use tempfile::TempDir;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: ExtCommands,
    }

    async fn started_host(dir: &TempDir) -> ExtensionHost {
        let config = HostConfig {
            plugin_dirs: vec![dir.path().join("plugins")],
            ..HostConfig::default()
        };
        let host = ExtensionHost::in_memory(config)
            .with_preferences_path(dir.path().join("registry.toml"));
        host.start(builtin_plugins()).await.unwrap();
        host
    }

    #[test]
    fn test_list_parses_filters() {
        let cli = TestCli::parse_from(["test", "list", "--kind", "exportFormat", "--supports", "note"]);
        match cli.command {
            ExtCommands::List { kind, supports, .. } => {
                assert_eq!(kind, Some(ExtensionKind::ExportFormat));
                assert_eq!(supports, Some(ContentKind::Note));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(TestCli::try_parse_from(["test", "list", "--kind", "widget"]).is_err());
    }

    #[test]
    fn test_export_defaults_to_note() {
        let cli = TestCli::parse_from([
            "test", "export", "fmt", "--title", "T", "--out", "/tmp/x.md",
        ]);
        assert!(matches!(
            cli.command,
            ExtCommands::Export { kind: ContentKind::Note, ref body, .. } if body.is_empty()
        ));
    }

    #[test]
    fn test_filter_kinds_intersect() {
        let filter = ExtensionFilter {
            location: Some(ToolbarLocation::Editor),
            ..Default::default()
        };
        assert_eq!(filter.kinds(), vec![ExtensionKind::Toolbar]);

        let filter = ExtensionFilter {
            kind: Some(ExtensionKind::Command),
            supports: Some(ContentKind::Note),
            ..Default::default()
        };
        assert!(filter.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_rows_for_builtins() {
        let dir = TempDir::new().unwrap();
        let host = started_host(&dir).await;

        let rows = extension_rows(host.registry(), &ExtensionFilter::default());
        assert_eq!(rows.len(), host.registry().stats().total);
        assert!(rows.iter().any(|r| r.id == "builtin.word-count:showWordCount"
            && r.details == "Ctrl+Shift+W"));

        let exports = extension_rows(
            host.registry(),
            &ExtensionFilter {
                supports: Some(ContentKind::Note),
                ..Default::default()
            },
        );
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].details, ".md for note");

        let none = extension_rows(
            host.registry(),
            &ExtensionFilter {
                supports: Some(ContentKind::Canvas),
                ..Default::default()
            },
        );
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_drain_collects_published_notifications() {
        let dir = TempDir::new().unwrap();
        let host = started_host(&dir).await;
        let mut rx = host.notifications().subscribe();

        let ctx = CommandContext {
            project_id: None,
            selection: Some(serde_json::json!("one two")),
        };
        host.registry()
            .execute_command("builtin.word-count:showWordCount", ctx)
            .await
            .unwrap();

        let notifications = drain(&mut rx);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].plugin_id, "builtin.word-count");
        assert!(notifications[0].message.contains("Words: 2"));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_export_writes_markdown() {
        let dir = TempDir::new().unwrap();
        let host = started_host(&dir).await;
        let out = dir.path().join("note.md");

        export_content(
            &host,
            "builtin.plain-text:markdown",
            ContentKind::Note,
            "Plan".to_string(),
            "ship".to_string(),
            out.clone(),
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "# Plan\n\nship\n");
    }
}
