//! HTTP transport for the cache controller.
//!
//! ### Relaying
//! - Method, end-to-end headers and body are forwarded unchanged.
//! - Redirects are returned to the caller, never followed.
//! - Bodies are not decompressed; what the upstream sends is what is cached.
//!
//! ### Failure classification
//! - Deadline exceeded: [`NetworkError::Timeout`]
//! - Connection could not be established: [`NetworkError::Offline`]
//! - Anything else, including a truncated body: [`NetworkError::Transport`]
//!
//! Any HTTP status, 5xx included, is a successful call.

pub mod headers;
pub mod url;

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

pub use headers::end_to_end;
pub use url::{UrlError, upstream_url};

use wishlist_edge_core::{AppConfig, Error, Network, NetworkError, Request, Response};

/// Configuration for the upstream client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "wishlist-edge/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "wishlist-edge/0.1".to_string(), timeout: Duration::from_millis(20000) }
    }
}

impl FetchConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout() }
    }
}

/// [`Network`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    http: Client,
}

impl HttpNetwork {
    /// Create a new client with the given configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::InvalidInput(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }
}

fn classify(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout(err.to_string())
    } else if err.is_connect() {
        NetworkError::Offline(err.to_string())
    } else {
        NetworkError::Transport(err.to_string())
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn send(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(end_to_end(&request.headers));
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = end_to_end(response.headers());
        let body = response.bytes().await.map_err(classify)?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "upstream responded"
        );

        Ok(Response { status, headers, body })
    }
}
