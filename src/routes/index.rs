//! Informational landing page

use axum::{http::header, response::IntoResponse};

/// Body of the landing page
pub const INDEX_PAGE: &str = "Proxy is Running!  Requests are forwarded to the Gemini API.";

/// `/` and `/index.html`, regardless of method
pub async fn index_page() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], INDEX_PAGE)
}
