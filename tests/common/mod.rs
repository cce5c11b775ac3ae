//! Common test utilities for Gemini Balance
//!
//! This module provides shared fixtures: a scripted in-process upstream client
//! that records every outbound request, and helpers that build a full router
//! around either that stub or a wiremock backend.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use bytes::Bytes;
use futures::stream;

use gemini_balance::{
    error::{AppError, AppResult},
    proxy::{UpstreamClient, UpstreamRequest, UpstreamResponse},
    routes, AppState, Config, GenerationPolicy,
};

/// Test configuration constants
pub mod constants {
    /// A plausible-looking Gemini key
    pub const TEST_KEY_A: &str = "AIzaSyTestKeyAAAAAAAAAAAAAAAAAAAAAAAAA";
    /// Another one
    pub const TEST_KEY_B: &str = "AIzaSyTestKeyBBBBBBBBBBBBBBBBBBBBBBBBB";
    /// Image-generation model id
    pub const IMAGE_MODEL: &str = "imagen-image-generation-001";
    /// Regular text model id
    pub const TEXT_MODEL: &str = "gemini-2.0-flash";
    /// Address nothing listens on
    pub const UNREACHABLE_UPSTREAM: &str = "http://127.0.0.1:1";
}

/// What the stub answers with
#[derive(Clone)]
pub enum StubReply {
    Respond {
        status: StatusCode,
        headers: Vec<(&'static str, &'static str)>,
        chunks: Vec<&'static str>,
    },
    Fail(&'static str),
}

impl StubReply {
    /// `200 OK` with a JSON body
    pub fn ok_json(body: &'static str) -> Self {
        Self::Respond {
            status: StatusCode::OK,
            headers: vec![("content-type", "application/json")],
            chunks: vec![body],
        }
    }
}

/// In-process upstream client that records requests and replays a script
pub struct StubUpstream {
    reply: StubReply,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl StubUpstream {
    pub fn new(reply: StubReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every request sent so far
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The single request sent so far
    pub fn only_request(&self) -> UpstreamRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one upstream request");
        requests.into_iter().next().unwrap()
    }
}

#[async_trait]
impl UpstreamClient for StubUpstream {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn send(&self, request: UpstreamRequest) -> AppResult<UpstreamResponse> {
        self.requests.lock().unwrap().push(request);

        match &self.reply {
            StubReply::Respond { status, headers, chunks } => {
                let mut header_map = HeaderMap::new();
                for (name, value) in headers {
                    header_map.append(
                        HeaderName::from_bytes(name.as_bytes()).unwrap(),
                        HeaderValue::from_static(*value),
                    );
                }
                let chunks: Vec<Result<Bytes, std::io::Error>> = chunks
                    .iter()
                    .map(|chunk| Ok(Bytes::from_static((*chunk).as_bytes())))
                    .collect();

                Ok(UpstreamResponse {
                    status: *status,
                    headers: header_map,
                    body: Box::pin(stream::iter(chunks)),
                })
            }
            StubReply::Fail(message) => Err(AppError::Internal(anyhow::anyhow!(*message))),
        }
    }
}

/// Config pointing at `upstream_url` with the given policy
pub fn test_config(upstream_url: &str, policy: GenerationPolicy) -> Config {
    let mut config = Config::with_upstream(upstream_url);
    config.generation_policy = policy;
    config
}

/// Router backed by a stub upstream
pub fn stub_server(reply: StubReply, policy: GenerationPolicy) -> (TestServer, Arc<StubUpstream>) {
    let stub = StubUpstream::new(reply);
    let config = test_config("https://generativelanguage.googleapis.com", policy);
    let state = Arc::new(AppState::new_for_testing(config, stub.clone()));
    let server = TestServer::new(routes::create_router(state)).expect("Failed to create test server");
    (server, stub)
}

/// Router backed by a real HTTP client talking to `upstream_url`
pub fn http_server(upstream_url: &str, policy: GenerationPolicy) -> TestServer {
    let config = test_config(upstream_url, policy);
    let state = Arc::new(AppState::new(config).expect("Failed to build app state"));
    TestServer::new(routes::create_router(state)).expect("Failed to create test server")
}
