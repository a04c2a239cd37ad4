//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tilecache::config::{config_file_path, ConfigFile};
use tilecache::coord::{CoverageRequest, GeoPoint};
use tilecache::logging::{init_logging, LoggingGuard};
use tilecache::provider::create_provider;
use tilecache::scheduler::{DownloadScheduler, JobManager};
use tilecache::store::TileStore;

use crate::error::CliError;

/// Area and zoom range of a coverage request.
#[derive(Debug, Clone, Args)]
pub struct CoverageArgs {
    /// Center latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Center longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Side length of the square area, in meters
    #[arg(long)]
    pub size: f64,

    /// Lowest zoom level to cache
    #[arg(long)]
    pub min_zoom: u8,

    /// Highest zoom level to cache
    #[arg(long)]
    pub max_zoom: u8,
}

impl CoverageArgs {
    pub fn request(&self) -> CoverageRequest {
        CoverageRequest::new(
            GeoPoint::new(self.lat, self.lon),
            self.size,
            self.min_zoom,
            self.max_zoom,
        )
    }
}

/// Load the config file, falling back to defaults when it doesn't exist.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    Ok(ConfigFile::load_from(&path)?)
}

/// Apply `--cache-dir` and `--workers` overrides; CLI takes precedence.
pub fn apply_download_overrides(
    config: &mut ConfigFile,
    cache_dir: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<(), CliError> {
    if let Some(dir) = cache_dir {
        config.cache.directory = dir;
    }
    if let Some(workers) = workers {
        if workers == 0 {
            return Err(CliError::Config("--workers must be at least 1".to_string()));
        }
        config.download.workers = workers;
    }
    Ok(())
}

pub fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    init_logging(&config.logging.directory, &config.logging.file)
        .map_err(|e| CliError::LoggingInit(e.to_string()))
}

/// Open the store, build the provider and wrap them in a job manager.
///
/// Must run outside the async runtime: the provider's blocking HTTP client
/// cannot be created inside one.
pub fn build_manager(config: &ConfigFile) -> Result<Arc<JobManager>, CliError> {
    let store = Arc::new(TileStore::open(&config.cache.directory)?);
    let provider = create_provider(&config.provider_config())?;
    let scheduler = DownloadScheduler::new(store, provider, config.scheduler_config());
    Ok(Arc::new(JobManager::new(scheduler)))
}
