use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod prompt;

#[derive(Parser)]
#[command(name = "desklab", about = "Inspect and drive the desklab extension host")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer yes to every plugin confirmation without prompting
    #[arg(short, long, global = true)]
    yes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage plugins
    Plugin(commands::plugin::PluginArgs),
    /// Inspect and invoke contributed extensions
    Ext(commands::ext::ExtArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = commands::HostOptions { assume_yes: cli.yes };
    match cli.command {
        Commands::Plugin(args) => commands::plugin::run(args, options).await,
        Commands::Ext(args) => commands::ext::run(args, options).await,
    }
}
