//! Streaming-response aggregation for Ollama's generate API.
//!
//! This crate provides:
//!
//! - [`StreamAggregator`] — Sends a prompt upstream and concatenates the reply
//! - [`OllamaClient`] — Native `/api/generate` client returning a line stream
//! - [`ndjson_lines`] and [`LineSplitter`] — NDJSON framing over byte chunks
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use relay_config::RelayConfig;
//! use relay_llm::StreamAggregator;
//!
//! let config = RelayConfig::from_env()?;
//! let aggregator = StreamAggregator::new(&config)?;
//! let result = aggregator.aggregate(aggregator.model(), "Hello!").await?;
//! println!("{}", result.text);
//! ```

mod aggregate;
mod lines;
mod ollama;

pub use aggregate::{collect_stream, StreamAggregator};
pub use lines::{ndjson_lines, LineSplitter};
pub use ollama::{probe_models, LineStream, OllamaClient};
pub use relay_core::{AggregatedResult, GenerationRequest, RelayError, StreamChunk, NO_RESPONSE_SENTINEL};
