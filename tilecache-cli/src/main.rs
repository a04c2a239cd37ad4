//! tilecache CLI - download, inspect and serve a local tile cache.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::plan::PlanArgs;
use commands::preload::PreloadArgs;
use commands::serve::ServeArgs;

#[derive(Parser)]
#[command(name = "tilecache")]
#[command(version, about = "Download, cache and serve slippy-map tiles", long_about = None)]
struct Cli {
    /// Config file (default: ~/.tilecache/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file if it does not exist
    Init,
    /// Run the tile server
    Serve(ServeArgs),
    /// Download every tile covering an area, with a progress bar
    Preload(PreloadArgs),
    /// Show which tiles a preload would cover, without downloading
    Plan(PlanArgs),
    /// Inspect the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::run(config),
        Commands::Serve(args) => commands::serve::run(args, config),
        Commands::Preload(args) => commands::preload::run(args, config),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Cache { action } => commands::cache::run(action, config),
    };

    if let Err(e) = result {
        e.exit();
    }
}
