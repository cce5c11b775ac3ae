//! Conversion of backend responses into caller-facing responses

use axum::body::Body;
use axum::http::Response;

use super::headers::sanitize_response_headers;
use super::upstream::UpstreamResponse;
use crate::error::AppResult;

/// Turn a backend response into the response sent to the caller.
///
/// Status is copied verbatim, headers are sanitized, and the body is streamed
/// chunk by chunk. Dropping the returned body drops the upstream stream.
pub fn into_client_response(upstream: UpstreamResponse) -> AppResult<Response<Body>> {
    let mut response = Response::builder()
        .status(upstream.status)
        .body(Body::from_stream(upstream.body))?;
    *response.headers_mut() = sanitize_response_headers(&upstream.headers);
    Ok(response)
}
