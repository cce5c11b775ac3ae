//! Configuration management for Gemini Balance
//!
//! Configuration is loaded from environment variables.

use anyhow::{bail, Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Default backend the proxy forwards to
pub const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com";

/// How `:generateContent` payloads are rewritten before forwarding.
///
/// The two behaviors are mutually exclusive; exactly one is active per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPolicy {
    /// Strip search tools from image-generation models and force image output.
    /// Other models are forwarded untouched.
    #[default]
    SanitizeImageModels,
    /// Append a search tool to every generate-content call that lacks one.
    AutoInjectSearch,
}

impl FromStr for GenerationPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sanitize-image-models" => Ok(Self::SanitizeImageModels),
            "auto-inject-search" => Ok(Self::AutoInjectSearch),
            other => bail!(
                "unknown generation policy '{}', expected 'sanitize-image-models' or 'auto-inject-search'",
                other
            ),
        }
    }
}

impl fmt::Display for GenerationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SanitizeImageModels => write!(f, "sanitize-image-models"),
            Self::AutoInjectSearch => write!(f, "auto-inject-search"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Base URL of the generative-language backend (no trailing slash)
    pub upstream_url: String,
    /// Body rewriting policy for generate-content calls
    pub generation_policy: GenerationPolicy,
    /// Model probed by the key verification endpoint
    pub verify_model: String,
    /// Connect timeout for upstream requests (in seconds)
    pub connect_timeout_seconds: u64,

    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source; unset variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream_url = lookup("GEMINI_UPSTREAM_URL")
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !upstream_url.starts_with("http://") && !upstream_url.starts_with("https://") {
            bail!("GEMINI_UPSTREAM_URL must be an http(s) URL, got '{}'", upstream_url);
        }

        Ok(Self {
            host: lookup("GEMINI_BALANCE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("GEMINI_BALANCE_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid GEMINI_BALANCE_PORT")?,

            upstream_url,
            generation_policy: lookup("GEMINI_GENERATION_POLICY")
                .map(|v| v.parse())
                .unwrap_or(Ok(GenerationPolicy::default()))
                .context("Invalid GEMINI_GENERATION_POLICY")?,
            verify_model: lookup("GEMINI_VERIFY_MODEL")
                .unwrap_or_else(|| "gemini-2.0-flash-lite".to_string()),
            connect_timeout_seconds: lookup("GEMINI_CONNECT_TIMEOUT_SECONDS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("Invalid GEMINI_CONNECT_TIMEOUT_SECONDS")?,

            log_format: match lookup("LOG_FORMAT") {
                Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }

    /// Configuration pointing at a custom backend, with defaults elsewhere
    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_upstream(upstream_url: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            upstream_url: upstream_url.into().trim_end_matches('/').to_string(),
            generation_policy: GenerationPolicy::default(),
            verify_model: "gemini-2.0-flash-lite".to_string(),
            connect_timeout_seconds: 10,
            log_format: LogFormat::Pretty,
        }
    }
}
