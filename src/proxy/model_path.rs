//! Model identifier extraction from Gemini REST paths
//!
//! Paths follow `.../models/<id>:<action>`, e.g.
//! `/v1beta/models/gemini-2.0-flash:generateContent`.

use std::string::FromUtf8Error;

use thiserror::Error;

const MODELS_SEGMENT: &str = "/models/";

/// Why a model identifier could not be decoded
#[derive(Debug, Error)]
pub enum ModelPathError {
    #[error("malformed percent-escape in model id '{0}'")]
    MalformedEscape(String),

    #[error("model id is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Result of parsing a request path for a model identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelPath {
    /// Path addresses a model; holds the percent-decoded identifier
    Model(String),
    /// Path has no `/models/` segment
    NotModels,
}

impl ModelPath {
    /// Parse a request path.
    ///
    /// Takes the text between the first `/models/` and the next one (if any),
    /// cut at the first `:`, and percent-decodes it. Fails if a `%` is not
    /// followed by two hex digits or the decoded bytes are not UTF-8.
    pub fn parse(path: &str) -> Result<Self, ModelPathError> {
        let mut segments = path.split(MODELS_SEGMENT);
        segments.next();
        let Some(rest) = segments.next() else {
            return Ok(Self::NotModels);
        };
        let raw_id = rest.split(':').next().unwrap_or_default();
        if has_malformed_escape(raw_id) {
            return Err(ModelPathError::MalformedEscape(raw_id.to_string()));
        }
        let id = urlencoding::decode(raw_id)?;
        Ok(Self::Model(id.into_owned()))
    }

    /// The model identifier, or an empty string when the path addresses none.
    pub fn id(&self) -> &str {
        match self {
            Self::Model(id) => id,
            Self::NotModels => "",
        }
    }

    /// Whether the model produces images and must not be given search tools.
    pub fn is_image_model(&self) -> bool {
        self.id().contains("image-generation")
    }
}

/// `urlencoding` passes stray `%` through untouched; reject them instead.
fn has_malformed_escape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !matches!(
                (bytes.get(i + 1), bytes.get(i + 2)),
                (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
    })
}
