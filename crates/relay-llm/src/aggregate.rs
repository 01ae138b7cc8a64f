//! Accumulates a streamed generation into one answer.

use std::time::Duration;

use futures::{Stream, StreamExt};
use relay_config::RelayConfig;
use relay_core::{AggregatedResult, GenerationRequest, RelayError, StreamChunk};
use tracing::{debug, info, warn};

use crate::ollama::OllamaClient;

/// Running state for one stream.
#[derive(Debug, Default)]
struct Accumulator {
    text: String,
    fragments: usize,
    skipped: usize,
}

impl Accumulator {
    fn feed(&mut self, line: &[u8]) {
        match StreamChunk::parse(line) {
            Ok(chunk) => {
                self.text.push_str(&chunk.response);
                self.fragments += 1;
                if chunk.done {
                    debug!("Upstream marked stream done after {} fragments", self.fragments);
                }
            }
            Err(e) => {
                self.skipped += 1;
                debug!("Skipping line: {} ({})", e, String::from_utf8_lossy(line));
            }
        }
    }

    fn finish(self) -> AggregatedResult {
        AggregatedResult::new(self.text, self.fragments, self.skipped)
    }

    /// Ends the stream early: partial text wins over the error.
    fn interrupted(self, err: RelayError) -> Result<AggregatedResult, RelayError> {
        if self.text.is_empty() {
            return Err(err);
        }
        warn!("Stream interrupted after {} fragments, returning partial text: {}", self.fragments, err);
        Ok(self.finish())
    }
}

/// Concatenates the `response` field of every line in arrival order.
///
/// Malformed lines are skipped. Each wait for the next line is bounded by
/// `idle_timeout`. If the stream fails or stalls after some text arrived, the
/// partial text is returned; if it fails before, the error is.
pub async fn collect_stream<S>(lines: S, idle_timeout: Duration) -> Result<AggregatedResult, RelayError>
where
    S: Stream<Item = Result<Vec<u8>, RelayError>>,
{
    let mut lines = std::pin::pin!(lines);
    let mut acc = Accumulator::default();

    loop {
        let next = match tokio::time::timeout(idle_timeout, lines.next()).await {
            Ok(next) => next,
            Err(_) => return acc.interrupted(RelayError::Timeout(idle_timeout)),
        };

        match next {
            Some(Ok(line)) => acc.feed(&line),
            Some(Err(e)) => return acc.interrupted(e),
            None => return Ok(acc.finish()),
        }
    }
}

/// Issues one generation request per call and aggregates its stream.
///
/// Holds no per-request state, so one instance serves concurrent callers.
#[derive(Debug, Clone)]
pub struct StreamAggregator {
    client: OllamaClient,
    model: String,
    idle_timeout: Duration,
}

impl StreamAggregator {
    /// Creates an aggregator from a resolved configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            client: OllamaClient::new(config)?,
            model: config.model.clone(),
            idle_timeout: config.request_timeout(),
        })
    }

    /// Overrides the idle timeout taken from the configuration.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` to `model` and returns the aggregated answer.
    pub async fn aggregate(&self, model: &str, prompt: &str) -> Result<AggregatedResult, RelayError> {
        let request = GenerationRequest::new(model, prompt);

        let lines = self.client.generate_stream(&request).await?;
        let result = collect_stream(lines, self.idle_timeout).await?;
        info!(
            "Aggregated {} fragments ({} skipped, {} chars) from {}",
            result.fragments,
            result.skipped,
            result.text.len(),
            model
        );
        Ok(result)
    }

    /// Same as [`aggregate`](Self::aggregate), returning only the text.
    pub async fn aggregate_text(&self, model: &str, prompt: &str) -> Result<String, RelayError> {
        self.aggregate(model, prompt).await.map(|r| r.text)
    }
}
