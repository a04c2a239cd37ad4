//! Settings structs, one per `[section]` of the INI file.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::provider::ProviderConfig;
use crate::scheduler::SchedulerConfig;
use crate::server::TileJsonSettings;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub provider: ProviderSettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Listen address
    pub bind: SocketAddr,
    /// Base URL advertised in TileJSON; derived from `bind` when unset
    pub public_url: Option<String>,
}

impl ServerSettings {
    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Root of the `{z}/{x}/{y}.png` tile hierarchy
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub name: String,
    /// Tile URL with `{z}`, `{x}` and `{y}` placeholders
    pub url_template: String,
    pub attribution: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    /// Concurrent download workers per job
    pub workers: usize,
    /// HTTP timeout in seconds
    pub timeout: u64,
    /// Largest request accepted, in tiles
    pub max_tiles: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl ConfigFile {
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            name: self.provider.name.clone(),
            url_template: self.provider.url_template.clone(),
            user_agent: self.provider.user_agent.clone(),
            timeout: Duration::from_secs(self.download.timeout),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::with_workers(self.download.workers).max_tiles(self.download.max_tiles)
    }

    pub fn tilejson_settings(&self) -> TileJsonSettings {
        TileJsonSettings {
            name: self.provider.name.clone(),
            attribution: self.provider.attribution.clone(),
            public_url: self.server.public_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_defaults_to_bind() {
        let config = ConfigFile::default();
        assert_eq!(config.server.public_url(), "http://127.0.0.1:5000");
    }

    #[test]
    fn test_public_url_override_strips_slash() {
        let mut config = ConfigFile::default();
        config.server.public_url = Some("https://tiles.example.org/".to_string());
        assert_eq!(config.tilejson_settings().public_url, "https://tiles.example.org");
    }

    #[test]
    fn test_derived_configs() {
        let mut config = ConfigFile::default();
        config.download.timeout = 3;
        config.download.workers = 0;
        config.download.max_tiles = 500;

        assert_eq!(config.provider_config().timeout, Duration::from_secs(3));
        assert_eq!(config.scheduler_config().workers, 1);
        assert_eq!(config.scheduler_config().max_tiles, 500);
        assert_eq!(config.tilejson_settings().name, config.provider.name);
    }
}
