//! Cache inspection CLI commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tilecache::store::TileStore;

use super::common::load_config;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show tile count, size, zoom levels and bounds
    Stats {
        /// Tile cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, config_path: Option<&Path>) -> Result<(), CliError> {
    match action {
        CacheAction::Stats { cache_dir } => {
            let config = load_config(config_path)?;
            let dir = cache_dir.unwrap_or(config.cache.directory);
            if !dir.is_dir() {
                return Err(CliError::CacheMissing(dir));
            }

            let store = TileStore::new(&dir);
            let stats = store.stats();
            let metadata = store.metadata();

            println!("Tile cache: {}", dir.display());
            println!("  Tiles: {}", stats.tiles);
            println!("  Size:  {}", format_size(stats.bytes));

            if metadata.zoom_levels.is_empty() {
                println!("  No tiles cached yet.");
                return Ok(());
            }

            println!();
            println!("{:>4}  {:>21}  {:>21}", "Zoom", "Columns (x)", "Rows (y)");
            for (zoom, bounds) in &metadata.bounds_per_zoom {
                println!(
                    "{:>4}  {:>21}  {:>21}",
                    zoom,
                    format!("{}..{}", bounds.min_x, bounds.max_x),
                    format!("{}..{}", bounds.min_y, bounds.max_y)
                );
            }
            Ok(())
        }
    }
}

/// Formats a byte count as B, KB, MB or GB.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
