//! Router assembly and the embedded control UI.

use std::sync::Arc;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use rust_embed::RustEmbed;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::websocket;

#[derive(RustEmbed)]
#[folder = "src/static/"]
struct StaticAssets;

/// Build the application router.
///
/// - `/` plus `/app.js`, `/style.css`: embedded UI
/// - `/api/start`, `/api/status/{id}`, `/api/stop/{id}`, `/api/sessions`
/// - `/ws`: real-time log feed
/// - `/health`: liveness probe
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/app.js", get(app_js))
        .route("/style.css", get(style_css))
        .route("/api/start", post(handlers::start))
        .route("/api/status/{id}", get(handlers::status))
        .route("/api/stop/{id}", post(handlers::stop))
        .route("/api/sessions", get(handlers::sessions))
        .route("/ws", get(websocket::ws_handler))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn asset_string(name: &str) -> Option<String> {
    StaticAssets::get(name).and_then(|file| String::from_utf8(file.data.into_owned()).ok())
}

async fn index() -> Html<String> {
    Html(asset_string("index.html").unwrap_or_else(|| {
        "<!doctype html><title>TubePilot</title><p>UI assets missing.</p>".to_string()
    }))
}

async fn app_js() -> Response {
    asset_response("app.js", "application/javascript; charset=utf-8")
}

async fn style_css() -> Response {
    asset_response("style.css", "text/css; charset=utf-8")
}

fn asset_response(name: &str, content_type: &'static str) -> Response {
    match asset_string(name) {
        Some(body) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
