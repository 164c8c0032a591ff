//! Shared HTTP client for layer probing
//!
//! One reqwest `Client` (and its connection pool) is built per run and shared
//! by every probe worker.

use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use std::time::Duration;
use thiserror::Error;

use crate::infrastructure::config::{ProbeConfig, defaults};

#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("invalid user agent '{0}'")]
    InvalidUserAgent(String),

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// HTTP client configuration for probing
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    /// Whole-request timeout, connection setup included
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Honour `HTTP(S)_PROXY` from the environment
    pub use_system_proxy: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout: Duration::from_secs(defaults::TIMEOUT_SECONDS),
            max_redirects: defaults::MAX_REDIRECTS,
            use_system_proxy: true,
        }
    }
}

impl From<&ProbeConfig> for HttpClientConfig {
    fn from(probe: &ProbeConfig) -> Self {
        Self {
            user_agent: probe.user_agent.clone(),
            timeout: probe.timeout(),
            max_redirects: probe.max_redirects,
            use_system_proxy: probe.use_system_proxy,
        }
    }
}

/// Thin wrapper over a configured reqwest client
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self, HttpClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| HttpClientError::InvalidUserAgent(config.user_agent.clone()))?,
        );

        let mut builder = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build()?;
        tracing::debug!(
            "HTTP client ready (timeout {:?}, max redirects {})",
            config.timeout,
            config.max_redirects
        );

        Ok(Self { client, config })
    }

    /// Issue a HEAD request, following redirects
    pub async fn head(&self, url: &str) -> reqwest::Result<Response> {
        self.client.head(url).send().await
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
