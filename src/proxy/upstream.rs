//! Upstream client abstraction
//!
//! The proxy talks to the backend through [`UpstreamClient`] so the transport
//! can be swapped in tests. The default implementation is a pooled
//! `reqwest::Client`.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use tracing::{debug, error, instrument};

use crate::{config::Config, error::AppResult};

/// Stream type for response bodies coming back from the backend
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// A single outbound request
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// `None` sends no body at all
    pub body: Option<Bytes>,
}

/// Status, headers and a body that has not been read yet
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Transport used to reach the generative-language backend
///
/// Implementations issue exactly one request per call: no retries, and no
/// timeout beyond what the transport itself imposes.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Get the client name for logging
    fn name(&self) -> &'static str;

    /// Send a request and return once response headers have arrived.
    async fn send(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse>;
}

/// `reqwest`-backed client for the Gemini API
pub struct GeminiClient {
    client: reqwest::Client,
}

impl GeminiClient {
    /// Wrap an existing HTTP client
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a pooled HTTP client suited to long-lived streaming responses.
    ///
    /// Only the connect phase is bounded; token streams may run for minutes.
    pub fn build_http_client(config: &Config) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
    }
}

#[async_trait]
impl UpstreamClient for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse> {
        let UpstreamRequest { method, url, headers, body } = request;

        debug!(
            body_len = ?body.as_ref().map(Bytes::len),
            header_count = headers.len(),
            "Sending request upstream"
        );

        let mut builder = self.client.request(method, &url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to send request upstream");
            e
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        debug!(status = %status, "Received upstream response headers");

        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other);

        Ok(UpstreamResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
