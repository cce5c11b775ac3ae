//! HTTP routes for Gemini Balance
//!
//! Routing is by path suffix rather than by axum route table: every request
//! lands in a single fallback handler which classifies it and dispatches.

pub mod index;
pub mod passthrough;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{delegates::openai::openai_suffix, AppState};

/// Handler chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/` or `/index.html`, any method
    Index,
    /// `POST /verify`
    Verify,
    /// Path ends in an OpenAI endpoint name
    OpenAi,
    /// Everything else is forwarded to Gemini
    Proxy,
}

/// Classify a request by path, gating only `/verify` on the method.
pub fn classify(method: &Method, path: &str) -> Route {
    if path == "/" || path == "/index.html" {
        Route::Index
    } else if path == "/verify" && method == Method::POST {
        Route::Verify
    } else if openai_suffix(path).is_some() {
        Route::OpenAi
    } else {
        Route::Proxy
    }
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    match classify(request.method(), request.uri().path()) {
        Route::Index => index::index_page().await.into_response(),
        Route::Verify => state.verifier.handle(request).await,
        Route::OpenAi => state.openai.handle(request).await,
        Route::Proxy => passthrough::passthrough_handler(state, request).await,
    }
}
