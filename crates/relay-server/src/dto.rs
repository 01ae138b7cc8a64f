//! Data transfer objects for HTTP message serialization.

use serde::{Deserialize, Serialize};

/// Request body for the chat endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    /// Prompt text. Missing or `null` is the same as empty.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body for the chat endpoint.
///
/// Upstream failures are reported here as `"Error: ..."` text, never as an
/// HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}
