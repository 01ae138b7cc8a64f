//! Client for Ollama's native `/api/generate` endpoint.
//!
//! The response body is consumed incrementally as NDJSON lines rather than
//! buffered; see [`crate::lines`].

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use relay_config::RelayConfig;
use relay_core::{GenerationRequest, RelayError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::lines::ndjson_lines;

/// A stream of raw NDJSON lines from a generation response.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, RelayError>> + Send>>;

/// Response from Ollama's /api/tags endpoint.
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelInfo>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelInfo {
    name: String,
}

/// Error body Ollama sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

/// Lists the models installed on an Ollama instance.
pub async fn probe_models(upstream_url: &str) -> Result<Vec<String>, RelayError> {
    let client = Client::new();
    let url = format!("{}/api/tags", upstream_url.trim_end_matches('/'));
    let timeout = Duration::from_secs(5);

    let response = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| map_reqwest_error(e, timeout))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(map_http_status(status, &body));
    }

    let tags: OllamaTagsResponse = response
        .json()
        .await
        .map_err(|e| RelayError::UpstreamUnreachable(format!("failed to parse model list: {}", e)))?;

    let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
    info!("Ollama reports {} installed models", models.len());
    Ok(models)
}

/// Client for streaming generations from one Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    generate_url: String,
    connect_timeout: Duration,
    idle_timeout: Duration,
}

impl OllamaClient {
    /// Creates a client for the upstream named in `config`.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let connect_timeout = config.connect_timeout();
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| RelayError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            generate_url: config.generate_url(),
            connect_timeout,
            idle_timeout: config.request_timeout(),
        })
    }

    pub fn generate_url(&self) -> &str {
        &self.generate_url
    }

    /// Sends a generation request and returns the body as a line stream.
    ///
    /// Resolves once the response head arrives. Waiting for the head is
    /// bounded by the idle timeout; reading the body is left to the caller.
    pub async fn generate_stream(&self, request: &GenerationRequest) -> Result<LineStream, RelayError> {
        debug!("POST {} (model: {})", self.generate_url, request.model);

        let send = self.client.post(&self.generate_url).json(request).send();
        let response = tokio::time::timeout(self.idle_timeout, send)
            .await
            .map_err(|_| RelayError::Timeout(self.idle_timeout))?
            .map_err(|e| map_reqwest_error(e, self.connect_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = tokio::time::timeout(self.idle_timeout, response.text())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            return Err(map_http_status(status, &body));
        }

        let connect_timeout = self.connect_timeout;
        let bytes = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| map_reqwest_error(e, connect_timeout)));

        Ok(Box::pin(ndjson_lines(bytes)))
    }
}

/// Maps a non-success status and its body to a [`RelayError`].
pub(crate) fn map_http_status(status: StatusCode, body: &str) -> RelayError {
    let body = body.trim();
    let message = match serde_json::from_str::<OllamaErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.is_empty() => body.to_string(),
        Err(_) => status.canonical_reason().unwrap_or("unknown status").to_string(),
    };
    RelayError::UpstreamHttp { status: status.as_u16(), message }
}

/// Maps a [`reqwest::Error`] to a [`RelayError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> RelayError {
    if err.is_timeout() {
        RelayError::Timeout(timeout)
    } else if err.is_body() || err.is_decode() {
        RelayError::UpstreamUnreachable(format!("stream interrupted: {}", err))
    } else {
        RelayError::UpstreamUnreachable(err.to_string())
    }
}
