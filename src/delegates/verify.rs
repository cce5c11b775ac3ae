//! API key verification
//!
//! `POST /verify` probes every key in `x-goog-api-key` with a tiny
//! generate-content call and streams one server-sent event per key as the
//! results come in.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::Delegate;
use crate::proxy::headers::{collect_credentials, mask_key, CREDENTIAL_HEADER};
use crate::proxy::upstream::{UpstreamClient, UpstreamRequest};

/// Verdict for a single key
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyHealth {
    Good,
    Bad,
}

/// One event in the verification stream
#[derive(Debug, Serialize)]
pub struct KeyStatus {
    pub key: String,
    pub status: KeyHealth,
    pub error: Option<String>,
}

/// Verifies API keys against a probe model
#[derive(Clone)]
pub struct KeyVerifier {
    upstream: Arc<dyn UpstreamClient>,
    base_url: String,
    model: String,
}

impl KeyVerifier {
    /// Create a verifier that probes `model` on `base_url`
    pub fn new(upstream: Arc<dyn UpstreamClient>, base_url: &str, model: &str) -> Self {
        Self {
            upstream,
            base_url: base_url.to_string(),
            model: model.to_string(),
        }
    }

    /// Probe a single key.
    pub async fn probe(&self, key: &str) -> KeyStatus {
        let status = match self.try_probe(key).await {
            Ok(()) => KeyStatus { key: key.to_string(), status: KeyHealth::Good, error: None },
            Err(reason) => KeyStatus {
                key: key.to_string(),
                status: KeyHealth::Bad,
                error: Some(reason),
            },
        };
        info!(key = %mask_key(key), status = ?status.status, "Verified API key");
        status
    }

    async fn try_probe(&self, key: &str) -> Result<(), String> {
        let key_value = HeaderValue::from_str(key)
            .map_err(|_| "key contains characters not allowed in a header".to_string())?;

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(CREDENTIAL_HEADER), key_value);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let payload = json!({ "contents": [{ "role": "user", "parts": [{ "text": "Hi" }] }] });

        let request = UpstreamRequest {
            method: Method::POST,
            url: format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ),
            headers,
            body: Some(Bytes::from(payload.to_string())),
        };

        let response = self.upstream.send(request).await.map_err(|e| e.describe())?;
        if response.status.is_success() {
            return Ok(());
        }

        let status = response.status;
        let mut body = Vec::new();
        let mut stream = response.body;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => body.extend_from_slice(&chunk),
                Err(e) => {
                    warn!(error = %e, "Failed to read verification error body");
                    break;
                }
            }
        }

        Err(upstream_error_message(status, &body))
    }
}

/// Pull `error.message` out of a Gemini error body, or fall back to the status.
fn upstream_error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("upstream returned {}", status))
}

fn sse_event<T: Serialize>(data: &T) -> Bytes {
    let payload = serde_json::to_string(data).unwrap_or_else(|_| "null".to_string());
    Bytes::from(format!("data: {}\n\n", payload))
}

#[async_trait]
impl Delegate for KeyVerifier {
    fn name(&self) -> &'static str {
        "verify"
    }

    async fn handle(&self, request: Request) -> Response {
        let keys = collect_credentials(request.headers(), CREDENTIAL_HEADER);
        if keys.is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("No API keys found in the {} header\n", CREDENTIAL_HEADER),
            )
                .into_response();
        }

        info!(count = keys.len(), model = %self.model, "Verifying API keys");

        let mut probes: FuturesUnordered<_> = keys
            .into_iter()
            .map(|key| {
                let verifier = self.clone();
                async move { verifier.probe(&key).await }
            })
            .collect();

        let events = async_stream::stream! {
            while let Some(status) = probes.next().await {
                yield Ok::<_, Infallible>(sse_event(&status));
            }
            yield Ok(Bytes::from_static(b"data: [DONE]\n\n"));
        };

        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(events),
        )
            .into_response()
    }
}
