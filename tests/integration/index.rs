//! Landing page and routing integration tests

use axum::http::{header, StatusCode};
use gemini_balance::GenerationPolicy;

use crate::common::{stub_server, StubReply};

#[tokio::test]
async fn test_root_serves_info_page() {
    let (server, stub) = stub_server(StubReply::ok_json("{}"), GenerationPolicy::default());

    let response = server.get("/").await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html"
    );
    assert!(response.text().contains("Proxy is Running"));
    assert!(stub.requests().is_empty(), "info page must not reach the backend");
}

#[tokio::test]
async fn test_index_html_serves_info_page_for_any_method() {
    let (server, stub) = stub_server(StubReply::ok_json("{}"), GenerationPolicy::default());

    let response = server.post("/index.html").await;

    response.assert_status_ok();
    assert!(response.text().contains("Proxy is Running"));
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_get_verify_falls_through_to_proxy() {
    let (server, stub) = stub_server(
        StubReply::Respond {
            status: StatusCode::NOT_FOUND,
            headers: vec![("content-type", "text/html")],
            chunks: vec!["not found"],
        },
        GenerationPolicy::default(),
    );

    let response = server.get("/verify").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "not found");
    assert_eq!(
        stub.only_request().url,
        "https://generativelanguage.googleapis.com/verify"
    );
}
