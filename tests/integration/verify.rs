//! Key verification integration tests

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use gemini_balance::GenerationPolicy;
use serde_json::Value;

use crate::common::{constants::*, http_server};
use crate::mocks::MockGemini;

/// Parse the `data:` events of an SSE body, excluding the `[DONE]` marker
fn parse_events(body: &str) -> Vec<Value> {
    body.split("\n\n")
        .filter_map(|event| event.strip_prefix("data: "))
        .filter(|data| *data != "[DONE]")
        .map(|data| serde_json::from_str(data).expect("event is not JSON"))
        .collect()
}

#[tokio::test]
async fn test_verify_reports_each_key() {
    let gemini = MockGemini::start().await;
    gemini
        .mock_generate_content_for_key("gemini-2.0-flash-lite", TEST_KEY_A)
        .await;
    let server = http_server(&gemini.uri(), GenerationPolicy::default());

    let response = server
        .post("/verify")
        .add_header(
            HeaderName::from_static("x-goog-api-key"),
            HeaderValue::from_str(&format!("{}, {}", TEST_KEY_A, TEST_KEY_B)).unwrap(),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );

    let text = response.text();
    assert!(text.trim_end().ends_with("data: [DONE]"));

    let mut events = parse_events(&text);
    events.sort_by_key(|event| event["key"].as_str().unwrap_or_default().to_string());
    assert_eq!(events.len(), 2);

    assert_eq!(events[0]["key"], TEST_KEY_A);
    assert_eq!(events[0]["status"], "GOOD");
    assert!(events[0]["error"].is_null());

    assert_eq!(events[1]["key"], TEST_KEY_B);
    assert_eq!(events[1]["status"], "BAD");
    assert_eq!(
        events[1]["error"],
        "API key not valid. Please pass a valid API key."
    );

    assert_eq!(gemini.received_requests().await.len(), 2);
}

#[tokio::test]
async fn test_verify_without_keys_is_rejected() {
    let gemini = MockGemini::start().await;
    let server = http_server(&gemini.uri(), GenerationPolicy::default());

    let response = server.post("/verify").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(gemini.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_verify_marks_unreachable_backend_as_bad() {
    let server = http_server(UNREACHABLE_UPSTREAM, GenerationPolicy::default());

    let response = server
        .post("/verify")
        .add_header(
            HeaderName::from_static("x-goog-api-key"),
            HeaderValue::from_static(TEST_KEY_A),
        )
        .await;

    response.assert_status_ok();
    let events = parse_events(&response.text());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["status"], "BAD");
    assert!(events[0]["error"].as_str().unwrap().contains("Upstream request failed"));
}
