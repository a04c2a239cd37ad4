//! Preload command - download an area in the foreground.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tilecache::scheduler::{JobState, JobStatus};

use super::common::{
    apply_download_overrides, build_manager, load_config, start_logging, CoverageArgs,
};
use crate::error::CliError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tiles ({eta}) {msg}";

#[derive(Debug, Args)]
pub struct PreloadArgs {
    #[command(flatten)]
    pub coverage: CoverageArgs,

    /// Tile cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Concurrent download workers
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Run the preload command.
pub fn run(args: PreloadArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    apply_download_overrides(&mut config, args.cache_dir, args.workers)?;

    let _logging_guard = start_logging(&config)?;
    let manager = build_manager(&config)?;

    let started = manager.submit(args.coverage.request())?;

    let signal_manager = Arc::clone(&manager);
    ctrlc::set_handler(move || {
        if signal_manager.cancel().is_some() {
            eprintln!();
            eprintln!("Cancelling, waiting for in-flight tiles...");
        }
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    println!(
        "Downloading {} tiles from {} into {}",
        started.total,
        config.provider.name,
        config.cache.directory.display()
    );

    let bar = ProgressBar::new(started.total);
    bar.set_style(progress_style());

    loop {
        let status = manager.status();
        bar.set_position(status.completed);
        bar.set_message(progress_message(&status));
        if !status.is_active {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    let finished = manager.wait();
    bar.set_position(finished.completed);
    match finished.state {
        JobState::Cancelled => bar.abandon_with_message("cancelled"),
        _ => bar.finish_with_message(progress_message(&finished)),
    }

    print_summary(&finished);
    Ok(())
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn progress_message(status: &JobStatus) -> String {
    format!("{} new, {} failed", status.downloaded, status.failed)
}

fn print_summary(status: &JobStatus) {
    let skipped = status
        .completed
        .saturating_sub(status.downloaded + status.failed);

    println!();
    println!("Download {}", status.state);
    println!("───────────────");
    println!("  Attempted:  {} of {}", status.completed, status.total);
    println!("  Downloaded: {}", status.downloaded);
    println!("  Cached:     {}", skipped);
    println!("  Failed:     {}", status.failed);
    if status.failed > 0 {
        println!();
        println!("Failed tiles are not retried; run the same preload again to fill the gaps.");
    }
}
