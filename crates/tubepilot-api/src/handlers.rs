//! HTTP handlers.
//!
//! `start` is fire-and-forget: it validates, creates the session and spawns
//! the automation task, then returns immediately. Progress reaches clients
//! through the status endpoint and the log feed, never through `start`'s
//! response.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info};
use tubepilot_automation::{AutomationError, ProgressSink, RunOutcome, validate};

use crate::error::ApiError;
use crate::session::{Session, SessionStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub success: bool,
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/start
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let url = body
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL is required.".to_string()))?;

    // Reject malformed URLs before any session or browser resource exists.
    validate::validate_video_url(&url).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let session_id = state.registry.create(&url);
    info!(session = %session_id, url = %url, "session created");

    let task_state = Arc::clone(&state);
    let task_id = session_id.clone();
    tokio::spawn(async move {
        run_automation(task_state, task_id, url).await;
    });

    Ok(Json(StartResponse {
        success: true,
        session_id,
        message: "Automation started.".to_string(),
    }))
}

async fn run_automation(state: Arc<AppState>, session_id: String, url: String) {
    let sink = state.session_sink(&session_id);

    match state.controller.play(&url, &sink).await {
        Ok(RunOutcome::Completed) => {
            state.registry.finish(&session_id, SessionStatus::Completed);
            info!(session = %session_id, "automation completed");
        }
        Ok(RunOutcome::Stopped) => {
            // The stop endpoint already marked and removed the session.
            debug!(session = %session_id, "automation stopped externally");
        }
        Err(e) => {
            // Synchronous rejections never pass through the sink inside the
            // controller; give the session a line explaining the failure.
            if matches!(
                e,
                AutomationError::Validation(_) | AutomationError::Concurrency
            ) {
                sink.error(&format!("Error occurred: {e}"));
            }
            state.registry.finish(&session_id, SessionStatus::Failed);
            error!(session = %session_id, error = %e, "automation failed");
        }
    }
}

/// GET /api/status/{id}
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    state
        .registry
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Session not found.".to_string()))
}

/// POST /api/stop/{id}
pub async fn stop(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StopResponse>, ApiError> {
    if state.registry.get(&id).is_none() {
        return Err(ApiError::NotFound("Session not found.".to_string()));
    }

    state.registry.finish(&id, SessionStatus::Stopped);
    state.registry.remove(&id);
    state.controller.stop().await;
    info!(session = %id, "session stopped");

    Ok(Json(StopResponse {
        success: true,
        message: "Automation stopped.".to_string(),
    }))
}

/// GET /api/sessions
pub async fn sessions(State(state): State<Arc<AppState>>) -> Json<Vec<Session>> {
    Json(state.registry.list())
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.uptime_secs(),
        "activeSessions": state.registry.active_count(),
    }))
}
