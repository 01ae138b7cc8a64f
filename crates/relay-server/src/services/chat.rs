//! Chat relay service - runs the aggregator and renders its outcome as text.

use relay_core::RelayError;
use relay_llm::StreamAggregator;
use tracing::{error, info};

/// Renders an aggregation outcome as the text placed in `response`.
pub fn render_reply(result: Result<String, RelayError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => format!("Error: {}", e),
    }
}

/// Relays one prompt to the configured model and returns the reply text.
///
/// Never fails: upstream errors become `"Error: ..."` text.
pub async fn relay_prompt(aggregator: &StreamAggregator, prompt: &str) -> String {
    let outcome = aggregator.aggregate(aggregator.model(), prompt).await;

    match &outcome {
        Ok(result) if result.is_sentinel() => info!("Model {} produced no text", aggregator.model()),
        Ok(_) => {}
        Err(e) => error!("Upstream error: {}", e),
    }

    render_reply(outcome.map(|r| r.text))
}
