//! Default values for all configuration settings.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::provider::{DEFAULT_PROVIDER_NAME, DEFAULT_URL_TEMPLATE, DEFAULT_USER_AGENT};
use crate::coord::MAX_REQUEST_TILES;
use crate::scheduler::DEFAULT_WORKERS;

/// Default listen address of the tile server.
pub const DEFAULT_BIND: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 5000));

/// Default HTTP timeout for tile fetches, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 10;

/// Default number of download workers.
pub const DEFAULT_DOWNLOAD_WORKERS: usize = DEFAULT_WORKERS;

/// Default per-request tile limit.
pub const DEFAULT_MAX_TILES: u64 = MAX_REQUEST_TILES;

pub const DEFAULT_ATTRIBUTION: &str = "Tiles © Esri";

pub const DEFAULT_LOG_FILE: &str = "tilecache.log";

/// Default tile cache directory (`~/.tilecache/tiles`).
pub fn default_cache_dir() -> PathBuf {
    config_directory().join("tiles")
}

/// Default log directory (`~/.tilecache/logs`).
pub fn default_log_dir() -> PathBuf {
    config_directory().join("logs")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind: DEFAULT_BIND,
                public_url: None,
            },
            cache: CacheSettings {
                directory: default_cache_dir(),
            },
            provider: ProviderSettings {
                name: DEFAULT_PROVIDER_NAME.to_string(),
                url_template: DEFAULT_URL_TEMPLATE.to_string(),
                attribution: DEFAULT_ATTRIBUTION.to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            download: DownloadSettings {
                workers: DEFAULT_DOWNLOAD_WORKERS,
                timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
                max_tiles: DEFAULT_MAX_TILES,
            },
            logging: LoggingSettings {
                directory: default_log_dir(),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
