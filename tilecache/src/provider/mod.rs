//! Remote tile provider abstraction
//!
//! This module provides the trait the downloader uses to fetch tiles
//! ([`TileProvider`]), an HTTP client seam for testing ([`HttpClient`]), and
//! the URL-template provider that talks to XYZ tile services.
//!
//! ```ignore
//! use tilecache::provider::{create_provider, ProviderConfig};
//!
//! let provider = create_provider(&ProviderConfig::default())?;
//! let bytes = provider.fetch(&TileCoord::new(12, 1205, 1539))?;
//! ```

mod http;
mod template;
mod types;

pub use http::{HttpClient, ReqwestClient};
pub use template::{create_provider, UrlTemplateProvider};
pub use types::{
    ProviderConfig, ProviderError, TileProvider, DEFAULT_PROVIDER_NAME, DEFAULT_TIMEOUT,
    DEFAULT_URL_TEMPLATE, DEFAULT_USER_AGENT,
};

#[cfg(test)]
pub use http::tests::MockHttpClient;
