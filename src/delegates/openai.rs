//! OpenAI-compatible endpoints
//!
//! Requests whose path ends in one of the OpenAI endpoint names are forwarded
//! to the backend's native OpenAI-compatible surface under `/v1beta/openai`.
//! Keys arrive as `Authorization: Bearer k1,k2,...`; one is picked at random.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use super::Delegate;
use crate::error::{AppError, AppResult};
use crate::proxy::headers::{collect_credentials, select_credential, split_credentials, CREDENTIAL_HEADER};
use crate::proxy::logging::RequestContext;
use crate::proxy::response::into_client_response;
use crate::proxy::upstream::{UpstreamClient, UpstreamRequest};
use crate::proxy::read_body;

/// Path suffixes served by the OpenAI-compatible surface.
///
/// `/chat/completions` is listed before `/completions` so the longer match wins.
pub const OPENAI_SUFFIXES: [&str; 4] = ["/chat/completions", "/completions", "/embeddings", "/models"];

/// Prefix of the backend's OpenAI-compatible API
const OPENAI_BASE_PATH: &str = "/v1beta/openai";

/// Return the OpenAI endpoint suffix `path` ends with, if any.
pub fn openai_suffix(path: &str) -> Option<&'static str> {
    OPENAI_SUFFIXES.into_iter().find(|suffix| path.ends_with(suffix))
}

/// Keys from `Authorization: Bearer ...`, falling back to `x-goog-api-key`.
pub fn bearer_credentials(headers: &HeaderMap) -> Vec<String> {
    let from_bearer: Vec<String> = headers
        .get_all(header::AUTHORIZATION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .flat_map(split_credentials)
        .collect();

    if from_bearer.is_empty() {
        collect_credentials(headers, CREDENTIAL_HEADER)
    } else {
        from_bearer
    }
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

/// Forwards OpenAI-style requests to the backend's compatibility layer
pub struct OpenAiCompat {
    upstream: Arc<dyn UpstreamClient>,
    base_url: String,
}

impl OpenAiCompat {
    /// Create a handler forwarding to `base_url`
    pub fn new(upstream: Arc<dyn UpstreamClient>, base_url: &str) -> Self {
        Self {
            upstream,
            base_url: base_url.to_string(),
        }
    }

    /// Build the backend URL for a request path and query.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> Option<String> {
        let suffix = openai_suffix(path)?;
        let query = query.map(|q| format!("?{}", q)).unwrap_or_default();
        Some(format!("{}{}{}{}", self.base_url, OPENAI_BASE_PATH, suffix, query))
    }

    async fn forward(&self, request: Request, ctx: &RequestContext) -> AppResult<Response> {
        let (parts, body) = request.into_parts();
        let url = self
            .target_url(parts.uri.path(), parts.uri.query())
            .ok_or_else(|| AppError::InvalidRequest(format!("not an OpenAI path: {}", parts.uri.path())))?;

        let mut headers = HeaderMap::new();
        let candidates = bearer_credentials(&parts.headers);
        let selected = select_credential(&candidates, &mut rand::rng()).map(str::to_string);
        ctx.log_key_selected(selected.as_deref(), candidates.len());
        if let Some(key) = &selected {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| AppError::InvalidRequest(format!("unusable API key: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        if let Some(content_type) = parts.headers.get(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, content_type.clone());
        }

        let body = if parts.method == Method::GET {
            None
        } else {
            Some(read_body(body).await?)
        };

        ctx.log_upstream_request(self.upstream.name(), &url, headers.len());
        let upstream = self
            .upstream
            .send(UpstreamRequest {
                method: parts.method,
                url,
                headers,
                body,
            })
            .await?;
        ctx.log_upstream_response(upstream.status.as_u16());

        let mut response = into_client_response(upstream)?;
        apply_cors(response.headers_mut());
        Ok(response)
    }
}

#[async_trait]
impl Delegate for OpenAiCompat {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn handle(&self, request: Request) -> Response {
        if request.method() == Method::OPTIONS {
            let mut response = StatusCode::NO_CONTENT.into_response();
            let headers = response.headers_mut();
            apply_cors(headers);
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("*"));
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
            return response;
        }

        let ctx = RequestContext::new(self.name(), request.method().as_str(), request.uri().path());
        ctx.log_request_start();

        let span = ctx.create_span();
        match self.forward(request, &ctx).instrument(span).await {
            Ok(response) => response,
            Err(e) => {
                ctx.log_error(&e.to_string());
                let mut response = e.into_response();
                apply_cors(response.headers_mut());
                response
            }
        }
    }
}
