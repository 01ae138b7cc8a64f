//! HTTP route handlers for the relay.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use relay_config::WelcomePage;

use crate::AppState;

pub mod chat;

const WELCOME_TEXT: &str = "Ollama Chat API is running.";
const WELCOME_HTML: &str = include_str!("../../static/index.html");

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// Serves the profile's welcome page.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    match state.config.welcome {
        WelcomePage::Text => WELCOME_TEXT.into_response(),
        WelcomePage::Html => Html(WELCOME_HTML).into_response(),
    }
}
