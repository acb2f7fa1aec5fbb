//! Network transport used by the resolver
//!
//! The resolver only needs "give me the body of this read request or tell me
//! it is unavailable". `HttpTransport` does that over reqwest; tests plug in
//! their own implementation to count calls and simulate failures.

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every provider request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Description of the network call to make when no fresh entry exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    /// HTTP method; always a read in this application
    pub method: Method,
    /// Fully-qualified URL including query string
    pub url: String,
}

impl RemoteRequest {
    /// Builds a GET request for `url`
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
        }
    }
}

/// Reasons a remote resource is unavailable
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),

    /// Body could not be decoded into the expected shape
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Network access is disabled
    #[error("offline mode")]
    Offline,
}

/// Performs read requests against the market-data provider
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the response body for a successful (2xx) response
    async fn fetch(&self, request: &RemoteRequest) -> Result<String, FetchError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with a default client
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("cryptovisual/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Creates a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &RemoteRequest) -> Result<String, FetchError> {
        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Transport that never reaches the network
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn fetch(&self, _request: &RemoteRequest) -> Result<String, FetchError> {
        Err(FetchError::Offline)
    }
}
