//! Error types for Gemini Balance
//!
//! Every failure on the proxy path resolves to a well-formed HTTP response:
//! `500 Internal Server Error` with a plain-text body carrying the error chain.

use std::error::Error as StdError;
use std::fmt::Write as _;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Failed to build response: {0}")]
    ResponseBuild(#[from] axum::http::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Render the error together with every underlying cause, one per line.
    pub fn describe(&self) -> String {
        let mut text = self.to_string();
        // Wrapped errors are already part of our own Display.
        let mut source = self.source().and_then(|wrapped| wrapped.source());
        while let Some(cause) = source {
            let _ = write!(text, "\n  caused by: {}", cause);
            source = cause.source();
        }
        text
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let detail = self.describe();
        error!(error = %detail, "Failed to fetch");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Internal Server Error\n{}", detail),
        )
            .into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
