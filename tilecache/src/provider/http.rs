//! HTTP client abstraction for testability

use std::time::Duration;

use super::types::{ProviderError, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the body of a 2xx response.
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Blocking HTTP client implementation using reqwest.
///
/// Tile downloads run on plain worker threads, so the blocking client is
/// used rather than the async one.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default 10 second timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_options(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Creates a new ReqwestClient with a custom timeout and user agent.
    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(url.to_string())
            } else {
                ProviderError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError::Transport(format!("Failed to read response: {}", e)))
    }
}
