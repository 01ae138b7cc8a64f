//! Core domain types and error definitions for ollama-relay.
//!
//! This crate provides the types shared by the aggregator and the server:
//!
//! - [`RelayError`] — Error type for upstream generation calls
//! - [`GenerationRequest`] — Body sent to Ollama's `/api/generate`
//! - [`StreamChunk`] — One decoded line of the upstream NDJSON stream
//! - [`AggregatedResult`] — The concatenated answer for one request
//!
//! # Example
//!
//! ```rust
//! use relay_core::{GenerationRequest, StreamChunk};
//!
//! let req = GenerationRequest::new("gemma3:1b", "Why is the sky blue?");
//! assert_eq!(req.model, "gemma3:1b");
//!
//! let chunk = StreamChunk::parse(br#"{"response":"Rayleigh","done":false}"#).unwrap();
//! assert_eq!(chunk.response, "Rayleigh");
//! ```

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Text returned when the upstream stream produced no usable fragments.
pub const NO_RESPONSE_SENTINEL: &str = "No response from model.";

/// Errors that can occur while talking to the upstream inference server.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Connection-level failure (refused, DNS, reset) before or during streaming.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned HTTP {status}: {message}")]
    UpstreamHttp { status: u16, message: String },

    /// No response head or body chunk arrived within the idle timeout.
    #[error("upstream timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// A single stream line could not be decoded. Never fatal to a stream.
    #[error("malformed stream chunk: {0}")]
    MalformedChunk(String),

    /// The local HTTP client could not be set up.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::MalformedChunk(err.to_string())
    }
}

/// Body of an upstream generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    /// Model the upstream server should run (passed through unvalidated).
    pub model: String,
    /// User-supplied prompt. May be empty.
    pub prompt: String,
}

impl GenerationRequest {
    /// Creates a new generation request.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { model: model.into(), prompt: prompt.into() }
    }
}

/// One line of the upstream NDJSON stream.
///
/// Only `response` feeds aggregation. `done` is read for logging only: it
/// is `true` just for a JSON `true`, and any other value (or its absence)
/// never fails the parse. Everything else the upstream sends is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default, deserialize_with = "lenient_done")]
    pub done: bool,
}

fn lenient_done<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value == serde_json::Value::Bool(true))
}

impl StreamChunk {
    /// Decodes one raw line. The line must be a JSON object.
    pub fn parse(line: &[u8]) -> Result<Self, RelayError> {
        Ok(serde_json::from_slice(line)?)
    }
}

/// Final answer assembled from one upstream stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedResult {
    /// Concatenated fragments, or [`NO_RESPONSE_SENTINEL`] when there were none.
    pub text: String,
    /// Number of lines that decoded successfully.
    pub fragments: usize,
    /// Number of lines discarded as malformed.
    pub skipped: usize,
}

impl AggregatedResult {
    /// Builds a result, substituting the sentinel for empty text.
    pub fn new(text: String, fragments: usize, skipped: usize) -> Self {
        let text = if text.is_empty() { NO_RESPONSE_SENTINEL.to_string() } else { text };
        Self { text, fragments, skipped }
    }

    /// Returns `true` if the upstream produced no usable text.
    pub fn is_sentinel(&self) -> bool {
        self.text == NO_RESPONSE_SENTINEL
    }
}
