//! Mock infrastructure for testing external services
//!
//! This module provides a wiremock-based stand-in for the Gemini backend,
//! covering both the native REST API and its OpenAI-compatible surface.


pub use gemini::*;
