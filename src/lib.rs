//! Gemini Balance - reverse proxy for the Gemini API
//!
//! This library provides the core functionality for the Gemini Balance proxy
//! server. It spreads requests over a caller-supplied set of API keys, strips
//! inbound headers down to an allow-list, rewrites generate-content payloads
//! where needed, and streams backend responses back to the caller.

pub mod config;
pub mod delegates;
pub mod error;
pub mod proxy;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use crate::config::{Config, GenerationPolicy};
pub use crate::delegates::{Delegate, KeyVerifier, OpenAiCompat};
pub use crate::proxy::{GeminiClient, UpstreamClient};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Transport used for every backend call
    pub upstream: Arc<dyn UpstreamClient>,
    /// Handler for `POST /verify`
    pub verifier: Arc<dyn Delegate>,
    /// Handler for OpenAI-style endpoints
    pub openai: Arc<dyn Delegate>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Initialize HTTP client with connection pooling
        let http_client = GeminiClient::build_http_client(&config)
            .context("Failed to build HTTP client")?;

        let upstream: Arc<dyn UpstreamClient> = Arc::new(GeminiClient::new(http_client));

        Ok(Self::assemble(config, upstream))
    }

    /// Create application state around a stub upstream client
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(config: Config, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self::assemble(config, upstream)
    }

    /// Both delegates share the upstream client and backend URL.
    fn assemble(config: Config, upstream: Arc<dyn UpstreamClient>) -> Self {
        let verifier: Arc<dyn Delegate> = Arc::new(KeyVerifier::new(
            upstream.clone(),
            &config.upstream_url,
            &config.verify_model,
        ));
        let openai: Arc<dyn Delegate> =
            Arc::new(OpenAiCompat::new(upstream.clone(), &config.upstream_url));

        Self {
            config,
            upstream,
            verifier,
            openai,
        }
    }
}
