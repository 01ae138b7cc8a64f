//! HTTP server entry point.
//!
//! Resolves configuration, checks that Ollama is reachable, and serves the
//! relay router.

use std::sync::Arc;

use anyhow::Result;
use relay_config::RelayConfig;
use relay_llm::probe_models;
use relay_server::{router, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = RelayConfig::from_env()?;
    info!(
        "Profile '{}': model {} via {} (CORS: {:?})",
        config.profile,
        config.model,
        config.upstream_url,
        config.cors
    );

    check_upstream(&config).await;

    let addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Logs whether the upstream is up and has the configured model.
async fn check_upstream(config: &RelayConfig) {
    match probe_models(&config.upstream_url).await {
        Ok(models) if models.iter().any(|m| m == &config.model) => {
            info!("Model {} is installed", config.model);
        }
        Ok(models) => {
            warn!("Model {} not found upstream (installed: {})", config.model, models.join(", "));
        }
        Err(e) => {
            warn!("Ollama probe failed (is Ollama running?): {}", e);
        }
    }
}
