//! Provider trait and error types.

use std::time::Duration;

use thiserror::Error;

use crate::coord::TileCoord;

/// Default per-request timeout for tile fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default provider: Esri ArcGIS World Imagery (note the `{y}/{x}` order).
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

/// Display name of the default provider.
pub const DEFAULT_PROVIDER_NAME: &str = "ArcGIS World Imagery";

/// Default `User-Agent` sent to tile providers.
pub const DEFAULT_USER_AGENT: &str = concat!("tilecache/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while fetching a tile.
///
/// Every variant means the same thing to the downloader: the tile is
/// unavailable right now and may be retried by a later job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The request did not complete within the timeout.
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// Connection, TLS or body read failure.
    #[error("Request failed: {0}")]
    Transport(String),

    /// URL template is missing one of the `{z}`, `{x}`, `{y}` placeholders.
    #[error("Invalid URL template '{0}': must contain {{z}}, {{x}} and {{y}}")]
    InvalidTemplate(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

/// A remote source of raster tiles.
///
/// Implementations must be shareable across the download worker threads.
pub trait TileProvider: Send + Sync {
    /// Downloads the raw image bytes of one tile.
    fn fetch(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError>;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}

/// Settings for building the default HTTP tile provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub url_template: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER_NAME.to_string(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
