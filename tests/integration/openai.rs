//! OpenAI-compatible forwarding integration tests

use axum::http::{header, HeaderValue};
use gemini_balance::GenerationPolicy;
use serde_json::{json, Value};

use crate::common::{constants::*, http_server, stub_server, StubReply};
use crate::mocks::MockGemini;

#[tokio::test]
async fn test_chat_completions_forwarded_to_openai_surface() {
    let gemini = MockGemini::start().await;
    gemini.mock_openai_chat_completion().await;
    let server = http_server(&gemini.uri(), GenerationPolicy::default());

    let response = server
        .post("/v1/chat/completions")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {},{}", TEST_KEY_A, TEST_KEY_B)).unwrap(),
        )
        .json(&json!({
            "model": "gemini-2.0-flash",
            "messages": [{ "role": "user", "content": "Hello" }]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["choices"][0]["message"]["content"], "Hello!");
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let requests = gemini.received_requests().await;
    assert_eq!(requests.len(), 1);
    let auth = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
    assert!(
        auth == format!("Bearer {}", TEST_KEY_A) || auth == format!("Bearer {}", TEST_KEY_B),
        "unexpected authorization: {}",
        auth
    );
    assert!(requests[0].headers.get("x-goog-api-key").is_none());
}

#[tokio::test]
async fn test_models_listing_uses_get_without_body() {
    let gemini = MockGemini::start().await;
    gemini.mock_openai_models().await;
    let server = http_server(&gemini.uri(), GenerationPolicy::default());

    let response = server
        .get("/v1/models")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer only-key"),
        )
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["object"], "list");
}

#[tokio::test]
async fn test_openai_paths_bypass_body_rewriting() {
    let (server, stub) = stub_server(StubReply::ok_json("{}"), GenerationPolicy::AutoInjectSearch);

    server
        .post("/v1/embeddings")
        .json(&json!({"model": "text-embedding-004", "input": "hi"}))
        .await
        .assert_status_ok();

    let request = stub.only_request();
    assert_eq!(
        request.url,
        "https://generativelanguage.googleapis.com/v1beta/openai/embeddings"
    );
    let forwarded: Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
    assert_eq!(forwarded, json!({"model": "text-embedding-004", "input": "hi"}));
}
