//! Tether CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Symbol-level file dependency graphs for AI context indexing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Project root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency graph from symbol exports and cache it
    Index {
        /// Rebuild even when a valid cached graph exists
        #[arg(short, long)]
        force: bool,
    },
    /// Print the analysis queue, fewest upstream dependencies first
    Queue,
    /// Show upstream and downstream dependencies of one file
    Show {
        /// File path, relative to the project root
        file: PathBuf,
    },
    /// List groups of mutually dependent files
    Cycles,
    /// Clear the cache
    Clear,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "tether={log_level},tether_core={log_level},tether_indexer={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Tether v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Project root: {}", cli.root.display());

    match cli.command {
        Commands::Index { force } => commands::index(cli.root, force).await,
        Commands::Queue => commands::queue(cli.root).await,
        Commands::Show { file } => commands::show(cli.root, file).await,
        Commands::Cycles => commands::cycles(cli.root).await,
        Commands::Clear => commands::clear(cli.root),
        Commands::Version => {
            println!("Tether v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
