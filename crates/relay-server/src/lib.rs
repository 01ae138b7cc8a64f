//! Axum router for the relay.
//!
//! Routes:
//!
//! - `GET /` — welcome page (text or HTML, per profile)
//! - `POST /chat` — relay a prompt and return `{"response": ...}`
//! - `GET /health` — liveness probe, excluded from request tracing

pub mod dto;
pub mod handlers;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use relay_config::{CorsPolicy, RelayConfig};
use relay_core::RelayError;
use relay_llm::StreamAggregator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared server state accessible from all handlers.
///
/// Read-only after startup; requests share it without locking.
pub struct AppState {
    pub config: RelayConfig,
    pub aggregator: StreamAggregator,
}

impl AppState {
    /// Builds state for a resolved configuration.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let aggregator = StreamAggregator::new(&config)?;
        Ok(Self { config, aggregator })
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/chat", post(handlers::chat::chat))
        .layer(trace_layer);

    let app = Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health));

    let app = match state.config.cors {
        CorsPolicy::AllowAny => app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        CorsPolicy::Disabled => app,
    };

    app.with_state(state)
}
