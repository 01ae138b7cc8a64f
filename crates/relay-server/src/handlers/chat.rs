//! JSON chat handler.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, Json};
use tracing::info;
use uuid::Uuid;

use crate::dto::{ChatRequest, ChatResponse};
use crate::services::chat::relay_prompt;
use crate::AppState;

/// Relays `message` upstream and returns the aggregated reply.
///
/// Always 200; the reply text carries upstream failures.
pub async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    let request_id = Uuid::new_v4();
    let message = req.message.unwrap_or_default();
    let preview: String = message.chars().take(50).collect();
    info!(%request_id, "Chat request (model: {}): {}...", state.aggregator.model(), preview);

    let start = Instant::now();
    let response = relay_prompt(&state.aggregator, &message).await;

    info!(%request_id, "Chat reply in {} ms ({} chars)", start.elapsed().as_millis(), response.len());
    Json(ChatResponse { response })
}
