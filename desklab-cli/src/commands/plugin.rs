//! Plugin management commands

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use desklab_core::{ExtensionHost, PluginInfo, PluginStatus};

use super::{HostOptions, open_host};

/// Plugin management arguments
#[derive(Args)]
pub struct PluginArgs {
    #[command(subcommand)]
    pub command: PluginCommands,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginCommands {
    /// List loaded plugins
    List,
    /// Show plugin details and its contributions
    Info {
        /// Plugin id
        id: String,
    },
    /// Enable a plugin and activate it
    Enable {
        /// Plugin id
        id: String,
    },
    /// Disable a plugin and remember the choice
    Disable {
        /// Plugin id
        id: String,
    },
}

/// Run plugin command
pub async fn run(args: PluginArgs, options: HostOptions) -> Result<()> {
    let host = open_host(options).await?;

    let result = match args.command {
        PluginCommands::List => {
            list_plugins(&host);
            Ok(())
        }
        PluginCommands::Info { id } => {
            show_plugin_info(&host, &id);
            Ok(())
        }
        PluginCommands::Enable { id } => set_enabled(&host, &id, true).await,
        PluginCommands::Disable { id } => set_enabled(&host, &id, false).await,
    };

    host.shutdown().await;
    result
}

fn status_color(status: PluginStatus) -> Color {
    match status {
        PluginStatus::Active => Color::Green,
        PluginStatus::Inactive => Color::Yellow,
        PluginStatus::Error => Color::Red,
        PluginStatus::Disabled => Color::DarkGrey,
    }
}

fn plugin_table(plugins: &[PluginInfo]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("Version").fg(Color::Cyan),
            Cell::new("Status").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Cyan),
        ]);

    for plugin in plugins {
        table.add_row(vec![
            Cell::new(plugin.id()),
            Cell::new(&plugin.manifest.version),
            Cell::new(plugin.status).fg(status_color(plugin.status)),
            Cell::new(&plugin.manifest.description),
        ]);
    }
    table
}

fn list_plugins(host: &ExtensionHost) {
    let plugins = host.plugins().plugins();
    if plugins.is_empty() {
        println!("No plugins loaded");
        println!();
        println!("Plugin directories:");
        for dir in &host.config().plugin_dirs {
            println!("  {}", dir.display());
        }
        return;
    }

    println!("{}", plugin_table(&plugins));

    let stats = host.plugins().stats();
    println!(
        "{} plugins: {} active, {} inactive, {} failed, {} disabled",
        stats.total, stats.active, stats.inactive, stats.error, stats.disabled
    );
}

fn show_plugin_info(host: &ExtensionHost, id: &str) {
    let Some(info) = host.plugins().plugin(id) else {
        println!("Plugin '{}' not found", id);
        return;
    };

    let manifest = &info.manifest;
    println!("Plugin: {}", manifest.name);
    println!("  Id:          {}", manifest.id);
    println!("  Version:     {}", manifest.version);
    if !manifest.description.is_empty() {
        println!("  Description: {}", manifest.description);
    }
    if let Some(author) = &manifest.author {
        println!("  Author:      {}", author);
    }
    if let Some(main) = &manifest.main {
        println!("  Entry:       {}", main);
    }
    println!("  Status:      {}", info.status);
    if let Some(error) = &info.error {
        println!("  Error:       {}", error);
    }
    if !info.has_instance {
        println!("  Code:        not linked (manifest only)");
    }

    if !manifest.permissions.is_empty() {
        let permissions: Vec<&str> = manifest.permissions.iter().map(|p| p.as_str()).collect();
        println!("  Permissions: {}", permissions.join(", "));
    }
    if !manifest.extension_points.is_empty() {
        let points: Vec<&str> = manifest.extension_points.iter().map(|k| k.as_str()).collect();
        println!("  Extends:     {}", points.join(", "));
    }

    let contributed = host.registry().owned_by(id);
    if !contributed.is_empty() {
        println!();
        println!("Contributions:");
        for extension in contributed {
            println!(
                "  {:<13} {:<40} {}",
                extension.kind().as_str(),
                extension.id(),
                extension.label()
            );
        }
    }
}

async fn set_enabled(host: &ExtensionHost, id: &str, enabled: bool) -> Result<()> {
    if !host.plugins().is_loaded(id) {
        println!("Plugin '{}' not found", id);
        return Ok(());
    }

    host.set_enabled(id, enabled).await?;

    let status = host
        .plugins()
        .status(id)
        .map(|s| s.to_string())
        .unwrap_or_default();
    let verb = if enabled { "Enabled" } else { "Disabled" };
    println!("{} plugin: {} ({})", verb, id, status);
    Ok(())
}
