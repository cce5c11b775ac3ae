//! Pass-through proxy handler
//!
//! Forwards every request not claimed by another route to the Gemini backend.
//! This is the single place where pipeline errors become responses.

use std::sync::Arc;

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::{proxy::forward_to_gemini, proxy::logging::RequestContext, AppState};

/// Pass-through handler for all requests not handled by specific routes
///
/// This handler:
/// 1. Reduces the inbound headers to one API key and the content type
/// 2. Rewrites generate-content JSON bodies according to the configured policy
/// 3. Streams the backend response back with sanitized headers
///
/// Any failure along the way is answered with a plain-text 500.
pub async fn passthrough_handler(state: Arc<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let mut ctx = RequestContext::new("proxy", parts.method.as_str(), parts.uri.path());
    ctx.log_request_start();

    let span = ctx.create_span();
    let result = forward_to_gemini(
        &state,
        &mut ctx,
        parts.method,
        &parts.uri,
        &parts.headers,
        body,
    )
    .instrument(span)
    .await;

    match result {
        Ok(response) => response,
        Err(e) => {
            ctx.log_error(&e.to_string());
            e.into_response()
        }
    }
}
