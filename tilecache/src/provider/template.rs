//! URL-template tile provider.
//!
//! Most XYZ tile services expose tiles at a URL of the form
//! `https://host/path/{z}/{x}/{y}.png`, sometimes with the row and column
//! swapped (ArcGIS uses `{z}/{y}/{x}`). A single provider parameterized by the
//! template covers all of them.

use std::sync::Arc;

use crate::coord::TileCoord;
use crate::provider::{HttpClient, ProviderConfig, ProviderError, ReqwestClient, TileProvider};

const PLACEHOLDERS: [&str; 3] = ["{z}", "{x}", "{y}"];

/// Tile provider that substitutes `{z}`, `{x}` and `{y}` into a URL template.
///
/// # Example
///
/// ```ignore
/// use tilecache::provider::{ReqwestClient, UrlTemplateProvider, DEFAULT_URL_TEMPLATE};
///
/// let client = ReqwestClient::new()?;
/// let provider = UrlTemplateProvider::new("ArcGIS", DEFAULT_URL_TEMPLATE, client)?;
/// let bytes = provider.fetch(&TileCoord::new(10, 301, 384))?;
/// ```
pub struct UrlTemplateProvider<C: HttpClient> {
    name: String,
    template: String,
    http_client: C,
}

impl<C: HttpClient> UrlTemplateProvider<C> {
    /// Creates a provider, rejecting templates without all three placeholders.
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        http_client: C,
    ) -> Result<Self, ProviderError> {
        let template = template.into();
        if !PLACEHOLDERS.iter().all(|p| template.contains(p)) {
            return Err(ProviderError::InvalidTemplate(template));
        }

        Ok(Self {
            name: name.into(),
            template,
            http_client,
        })
    }

    /// Builds the tile URL for the given coordinates.
    pub fn url_for(&self, tile: &TileCoord) -> String {
        self.template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl<C: HttpClient> TileProvider for UrlTemplateProvider<C> {
    fn fetch(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        let url = self.url_for(tile);
        self.http_client.get(&url)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builds the HTTP provider described by `config`.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn TileProvider>, ProviderError> {
    let client = ReqwestClient::with_options(config.timeout, &config.user_agent)?;
    let provider = UrlTemplateProvider::new(&config.name, &config.url_template, client)?;
    Ok(Arc::new(provider))
}
