//! Handlers that own their whole request/response cycle
//!
//! The router hands these the raw request and returns whatever they produce,
//! without touching it.

pub mod openai;
pub mod verify;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

pub use openai::OpenAiCompat;
pub use verify::KeyVerifier;

/// A self-contained request handler: request in, response out
#[async_trait]
pub trait Delegate: Send + Sync {
    /// Get the delegate name for logging
    fn name(&self) -> &'static str;

    /// Handle the request. Failures are rendered into the returned response.
    async fn handle(&self, request: Request) -> Response;
}
