//! Proxy module
//!
//! Handles request translation and forwarding to the Gemini backend.

pub mod body;
pub mod headers;
pub mod logging;
pub mod model_path;
pub mod pipeline;
pub mod response;
pub mod upstream;

use axum::body::Body;
use bytes::Bytes;
use http_body_util::BodyExt;

use crate::error::{AppError, AppResult};

pub use pipeline::forward_to_gemini;
pub use upstream::{GeminiClient, UpstreamClient, UpstreamRequest, UpstreamResponse};

/// Read an inbound request body to completion.
pub async fn read_body(body: Body) -> AppResult<Bytes> {
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| AppError::BodyRead(e.to_string()))
}
