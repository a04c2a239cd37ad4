//! Serve command - run the HTTP tile server.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tilecache::server::CacheServer;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::{apply_download_overrides, build_manager, load_config, start_logging};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (default from config: 127.0.0.1:5000)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Base URL advertised in tilejson.json
    #[arg(long)]
    pub public_url: Option<String>,

    /// Tile cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Download workers per preload job
    #[arg(long)]
    pub workers: Option<usize>,
}

/// Run the serve command.
pub fn run(args: ServeArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let mut config = load_config(config_path)?;
    apply_download_overrides(&mut config, args.cache_dir, args.workers)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(url) = args.public_url {
        config.server.public_url = Some(url);
    }

    let _logging_guard = start_logging(&config)?;

    // Built here rather than inside the runtime: the provider uses a blocking
    // HTTP client. Holding this Arc also keeps the last drop off the runtime.
    let manager = build_manager(&config)?;
    let server = CacheServer::new(Arc::clone(&manager), config.tilejson_settings());

    println!("Cache:    {}", config.cache.directory.display());
    println!("Provider: {}", config.provider.name);
    println!("Workers:  {}", config.download.workers);
    println!("Listening on http://{}", config.server.bind);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping server...");
        signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tilecache-http")
        .build()
        .map_err(CliError::Runtime)?;

    let bind = config.server.bind;
    runtime
        .block_on(async move {
            let listener = TcpListener::bind(bind).await?;
            server.serve(listener, shutdown).await
        })
        .map_err(|error| CliError::Serve {
            bind: bind.to_string(),
            error,
        })?;
    drop(runtime);

    let status = manager.wait();
    if status.job_id.is_some() {
        info!(
            state = %status.state,
            completed = status.completed,
            total = status.total,
            "Last download job"
        );
    }
    println!("Server stopped.");
    Ok(())
}
