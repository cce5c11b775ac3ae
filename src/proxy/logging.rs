//! Request logging utilities for Gemini proxying
//!
//! Provides structured logging with correlation IDs so a single request can be
//! followed from key selection to the upstream response.

use std::time::Instant;
use tracing::{debug, error, info, Span};
use uuid::Uuid;

use super::body::BodyAction;
use super::headers::mask_key;

/// Context for tracking a request through the pipeline
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Which handler is serving the request
    pub handler: String,
    /// HTTP method
    pub method: String,
    /// Request path as received
    pub endpoint: String,
    /// Model addressed by the request (if applicable)
    pub model: Option<String>,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(handler: &str, method: &str, endpoint: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(), // Short ID for readability
            start_time: Instant::now(),
            handler: handler.to_string(),
            method: method.to_string(),
            endpoint: endpoint.to_string(),
            model: None,
        }
    }

    /// Record the model addressed by this request
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = Some(model.into());
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Log request initiation
    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            handler = %self.handler,
            method = %self.method,
            endpoint = %self.endpoint,
            "Request started"
        );
    }

    /// Log which API key was picked from the inbound set
    pub fn log_key_selected(&self, key: Option<&str>, candidates: usize) {
        match key {
            Some(key) => info!(
                trace_id = %self.trace_id,
                key = %mask_key(key),
                candidates = %candidates,
                "Selected API key"
            ),
            None => debug!(
                trace_id = %self.trace_id,
                candidates = %candidates,
                "No API key to forward"
            ),
        }
    }

    /// Log what the body transformer did
    pub fn log_body_action(&self, action: &BodyAction, body_size: Option<usize>) {
        debug!(
            trace_id = %self.trace_id,
            action = ?action,
            body_size = ?body_size,
            "Request body prepared"
        );
    }

    /// Log request being sent to upstream
    pub fn log_upstream_request(&self, upstream: &str, url: &str, header_count: usize) {
        info!(
            trace_id = %self.trace_id,
            handler = %self.handler,
            upstream = %upstream,
            url = %url,
            header_count = %header_count,
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    /// Log response received from upstream
    pub fn log_upstream_response(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            handler = %self.handler,
            endpoint = %self.endpoint,
            model = ?self.model,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log request failure
    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            handler = %self.handler,
            endpoint = %self.endpoint,
            model = ?self.model,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Request failed"
        );
    }

    /// Create a tracing span for this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "proxy_request",
            trace_id = %self.trace_id,
            handler = %self.handler,
            endpoint = %self.endpoint,
        )
    }
}
