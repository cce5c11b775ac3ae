//! Header utilities for Gemini proxying
//!
//! Builds outbound request headers from an allow-list so that nothing but the
//! selected API key and the content type ever reaches the backend, and strips
//! transport-specific headers from backend responses.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Header carrying one or more comma-separated Gemini API keys
pub const CREDENTIAL_HEADER: &str = "x-goog-api-key";

/// Response headers tied to the upstream connection's framing
const STRIPPED_RESPONSE_HEADERS: &[&str] = &[
    "transfer-encoding",
    "connection",
    "keep-alive",
    "content-encoding",
];

/// Outcome of translating inbound headers
#[derive(Debug, Default)]
pub struct TranslatedHeaders {
    /// Headers to send upstream
    pub headers: HeaderMap,
    /// Key chosen from the inbound credential set, if any
    pub selected_key: Option<String>,
    /// Number of candidate keys the choice was made from
    pub candidate_count: usize,
}

/// Split a credential header value into its non-empty, trimmed keys.
pub fn split_credentials(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collect every key from all occurrences of `name`, as if the values had
/// been comma-joined into a single header.
pub fn collect_credentials(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(split_credentials)
        .collect()
}

/// Pick one key uniformly at random.
pub fn select_credential<'a, R: Rng + ?Sized>(candidates: &'a [String], rng: &mut R) -> Option<&'a str> {
    candidates.choose(rng).map(String::as_str)
}

/// Shorten a key for logs: `AIzaSyAB...wxyz`.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Build the outbound header map for a Gemini request.
///
/// Only the credential header (reduced to a single randomly chosen key) and
/// `content-type` are carried over. Every other inbound header is dropped.
pub fn translate_request_headers<R: Rng + ?Sized>(inbound: &HeaderMap, rng: &mut R) -> TranslatedHeaders {
    let mut translated = TranslatedHeaders::default();

    let candidates = collect_credentials(inbound, CREDENTIAL_HEADER);
    translated.candidate_count = candidates.len();
    if let Some(key) = select_credential(&candidates, rng) {
        // A key that cannot be a header value is treated as absent.
        if let Ok(value) = HeaderValue::from_str(key) {
            translated
                .headers
                .insert(HeaderName::from_static(CREDENTIAL_HEADER), value);
            translated.selected_key = Some(key.to_string());
        }
    }

    if let Some(content_type) = inbound.get(header::CONTENT_TYPE) {
        translated
            .headers
            .insert(header::CONTENT_TYPE, content_type.clone());
    }

    translated
}

/// Copy upstream response headers minus framing headers, and add
/// `Referrer-Policy: no-referrer`.
pub fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();

    for name in STRIPPED_RESPONSE_HEADERS {
        headers.remove(*name);
    }
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    headers
}
