//! Request body rewriting for Gemini generate-content calls
//!
//! Only JSON bodies sent to a `:generateContent` path are ever parsed. Anything
//! that cannot be parsed is forwarded byte-for-byte.

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::Method;
use bytes::Bytes;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::GenerationPolicy;

use super::model_path::ModelPath;

/// Path marker identifying a content-generation call
pub const GENERATE_CONTENT_MARKER: &str = ":generateContent";

/// Function-calling mode that disables all tool calls
pub const FUNCTION_CALLING_DISABLED: &str = "NONE";

/// Field spellings the backend accepts for the search tool
const SEARCH_TOOL_FIELDS: [&str; 2] = ["googleSearch", "google_search"];

/// What the transformer did with the inbound body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyAction {
    /// GET request; no body is sent
    Omitted,
    /// Forwarded unchanged
    Passthrough,
    /// Generate-content body that failed to parse; forwarded unchanged
    Malformed,
    /// Parsed and re-serialized
    Rewritten { model: String, image_model: bool },
}

/// Body to forward, plus a record of how it was produced
#[derive(Debug)]
pub struct TransformedBody {
    pub body: Option<Bytes>,
    pub action: BodyAction,
}

/// Whether `path` addresses a content-generation call.
pub fn is_generate_content(path: &str) -> bool {
    path.contains(GENERATE_CONTENT_MARKER)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Decide the outbound body for a request.
///
/// `headers` is the already-translated outbound header map; it is updated
/// when the body is re-serialized.
pub fn transform_body(
    method: &Method,
    path: &str,
    headers: &mut HeaderMap,
    raw: Bytes,
    policy: GenerationPolicy,
) -> TransformedBody {
    if method == Method::GET {
        return TransformedBody { body: None, action: BodyAction::Omitted };
    }

    if !is_json(headers) || raw.is_empty() || !is_generate_content(path) {
        return TransformedBody { body: Some(raw), action: BodyAction::Passthrough };
    }

    let mut payload: Value = match serde_json::from_slice(&raw) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "Generate-content body is not valid JSON, forwarding as-is");
            return TransformedBody { body: Some(raw), action: BodyAction::Malformed };
        }
    };

    let model = match ModelPath::parse(path) {
        Ok(model) => model,
        Err(e) => {
            debug!(error = %e, path = %path, "Model id is not decodable, forwarding as-is");
            return TransformedBody { body: Some(raw), action: BodyAction::Malformed };
        }
    };
    let image_model = model.is_image_model();

    if let Value::Object(obj) = &mut payload {
        match policy {
            GenerationPolicy::SanitizeImageModels if image_model => sanitize_image_request(obj),
            GenerationPolicy::SanitizeImageModels => {}
            GenerationPolicy::AutoInjectSearch => inject_search_tool(obj),
        }
    }

    let body = match serde_json::to_vec(&payload) {
        Ok(serialized) => Bytes::from(serialized),
        Err(e) => {
            warn!(error = %e, "Failed to re-serialize payload, forwarding original body");
            raw
        }
    };

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.remove(header::CONTENT_LENGTH);

    TransformedBody {
        body: Some(body),
        action: BodyAction::Rewritten { model: model.id().to_string(), image_model },
    }
}

/// Prepare a request for an image-generation model: no search tools, no
/// function calling, and image output enabled.
pub fn sanitize_image_request(obj: &mut Map<String, Value>) {
    let tools = match obj.remove("tools") {
        Some(Value::Array(tools)) => tools
            .into_iter()
            .filter(|tool| is_truthy(tool) && !is_search_tool(tool))
            .collect(),
        _ => Vec::new(),
    };
    obj.insert("tools".to_string(), Value::Array(tools));

    obj.insert(
        "toolConfig".to_string(),
        json!({ "functionCallingConfig": { "mode": FUNCTION_CALLING_DISABLED } }),
    );

    let generation_config = obj
        .entry("generationConfig")
        .or_insert_with(|| Value::Object(Map::new()));
    if !generation_config.is_object() {
        *generation_config = Value::Object(Map::new());
    }
    if let Value::Object(config) = generation_config {
        let has_image = config
            .get("responseModalities")
            .and_then(Value::as_array)
            .is_some_and(|modalities| modalities.iter().any(|m| m == "IMAGE"));
        if !has_image {
            config.insert("responseModalities".to_string(), json!(["TEXT", "IMAGE"]));
        }
    }
}

/// Append a search tool unless one is already present.
pub fn inject_search_tool(obj: &mut Map<String, Value>) {
    let tools = obj
        .entry("tools")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !tools.is_array() {
        *tools = Value::Array(Vec::new());
    }
    if let Value::Array(tools) = tools {
        if !tools.iter().any(is_search_tool) {
            tools.push(json!({ "googleSearch": {} }));
        }
    }
}

fn is_search_tool(tool: &Value) -> bool {
    SEARCH_TOOL_FIELDS
        .iter()
        .any(|field| tool.get(field).is_some_and(is_truthy))
}

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
