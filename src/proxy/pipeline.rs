//! Generic Gemini forwarding pipeline
//!
//! header translation -> body transformation -> upstream call -> response
//! sanitization, in that order, for every request not claimed by another route.

use axum::body::Body;
use axum::http::{Method, Response, Uri};
use axum::http::header::HeaderMap;
use bytes::Bytes;

use super::body::{transform_body, BodyAction};
use super::headers::translate_request_headers;
use super::logging::RequestContext;
use super::read_body;
use super::response::into_client_response;
use super::upstream::UpstreamRequest;
use crate::{error::AppResult, AppState};

/// Backend URL for an inbound path and query string.
pub fn target_url(base_url: &str, uri: &Uri) -> String {
    match uri.query() {
        Some(query) if !query.is_empty() => format!("{}{}?{}", base_url, uri.path(), query),
        _ => format!("{}{}", base_url, uri.path()),
    }
}

/// Forward one request to the Gemini backend and stream the answer back.
pub async fn forward_to_gemini(
    state: &AppState,
    ctx: &mut RequestContext,
    method: Method,
    uri: &Uri,
    inbound_headers: &HeaderMap,
    body: Body,
) -> AppResult<Response<Body>> {
    let path = uri.path();
    let url = target_url(&state.config.upstream_url, uri);

    let translated = translate_request_headers(inbound_headers, &mut rand::rng());
    ctx.log_key_selected(translated.selected_key.as_deref(), translated.candidate_count);
    let mut headers = translated.headers;

    let raw = if method == Method::GET {
        Bytes::new()
    } else {
        read_body(body).await?
    };

    let transformed = transform_body(
        &method,
        path,
        &mut headers,
        raw,
        state.config.generation_policy,
    );
    if let BodyAction::Rewritten { model, .. } = &transformed.action {
        ctx.set_model(model.as_str());
    }
    ctx.log_body_action(&transformed.action, transformed.body.as_ref().map(Bytes::len));

    ctx.log_upstream_request(state.upstream.name(), &url, headers.len());
    let upstream = state
        .upstream
        .send(UpstreamRequest {
            method,
            url,
            headers,
            body: transformed.body,
        })
        .await?;
    ctx.log_upstream_response(upstream.status.as_u16());

    into_client_response(upstream)
}
