use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use tubepilot_automation::{
    AutomationController, BrowserDriver, BrowserError, MonitorConfig, VideoPage,
};

use super::build_router;
use crate::logsink::FileLogSink;
use crate::state::AppState;

const VALID_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[derive(Default)]
struct ScriptedPage {
    click_results: Mutex<VecDeque<Result<bool, BrowserError>>>,
    eval_results: Mutex<VecDeque<Result<Value, BrowserError>>>,
}

#[async_trait]
impl VideoPage for ScriptedPage {
    async fn open(&self, _url: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn click_selector(&self, _selector: &str) -> Result<bool, BrowserError> {
        self.click_results.lock().pop_front().unwrap_or(Ok(false))
    }

    async fn evaluate(&self, _expression: &str) -> Result<Value, BrowserError> {
        self.eval_results.lock().pop_front().unwrap_or(Ok(json!(false)))
    }
}

#[derive(Default)]
struct ScriptedDriver {
    page: Arc<ScriptedPage>,
    open_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn ensure_open(&self) -> Result<Arc<dyn VideoPage>, BrowserError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.page) as Arc<dyn VideoPage>)
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

struct TestServer {
    app: Router,
    state: Arc<AppState>,
    driver: Arc<ScriptedDriver>,
    _logs: TempDir,
}

fn test_server() -> TestServer {
    let logs = TempDir::new().unwrap();
    let driver = Arc::new(ScriptedDriver::default());
    let controller = Arc::new(AutomationController::new(
        Arc::clone(&driver) as Arc<dyn BrowserDriver>,
        MonitorConfig::default(),
    ));
    let log_sink = Arc::new(FileLogSink::new(logs.path()).unwrap());
    let state = Arc::new(AppState::new(controller, log_sink));

    TestServer {
        app: build_router(Arc::clone(&state)),
        state,
        driver,
        _logs: logs,
    }
}

/// First monitor tick reports playing then ended, so a run completes as soon
/// as it reaches the monitor.
fn script_completion(page: &ScriptedPage) {
    let mut evals = page.eval_results.lock();
    evals.push_back(Ok(json!(true)));
    evals.push_back(Ok(json!(true)));
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn wait_for_status(app: &Router, id: &str, wanted: &str) -> Value {
    for _ in 0..120 {
        let (status, session) = send(app, get(&format!("/api/status/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        if session["status"] == json!(wanted) {
            return session;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("session {id} never reached status {wanted}");
}

#[tokio::test(start_paused = true)]
async fn test_start_requires_url() {
    let server = test_server();

    let (status, body) = send(&server.app, post_json("/api/start", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("URL is required."));
    assert!(server.state.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_rejects_invalid_url_without_creating_session() {
    let server = test_server();

    let (status, body) =
        send(&server.app, post_json("/api/start", json!({"url": "not-a-url"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid video URL"));
    assert!(server.state.registry.is_empty());
    assert_eq!(server.driver.open_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_accepts_and_run_completes() {
    let server = test_server();
    script_completion(&server.driver.page);

    let (status, body) =
        send(&server.app, post_json("/api/start", json!({"url": VALID_URL}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Automation started."));
    let id = body["sessionId"].as_str().unwrap().to_string();

    let session = wait_for_status(&server.app, &id, "completed").await;
    assert_eq!(session["url"], json!(VALID_URL));
    assert!(session.get("endTime").is_some());

    let logs = session["logs"].as_array().unwrap();
    assert!(
        logs.iter()
            .any(|l| l["type"] == json!("success")
                && l["message"] == json!("Video playback completed."))
    );
    assert_eq!(server.driver.open_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_status_unknown_session_is_404() {
    let server = test_server();

    let (status, body) = send(&server.app, get("/api/status/no-such-session")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Session not found."));
}

#[tokio::test(start_paused = true)]
async fn test_stop_unknown_session_is_404() {
    let server = test_server();

    let (status, body) = send(&server.app, post_json("/api/stop/no-such-session", json!({}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Session not found."));
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_run_removes_session_and_closes_browser() {
    // Empty eval queue keeps the monitor looping until stopped.
    let server = test_server();

    let (_, body) = send(&server.app, post_json("/api/start", json!({"url": VALID_URL}))).await;
    let id = body["sessionId"].as_str().unwrap().to_string();

    // Wait until the run has produced its first log line.
    for _ in 0..60 {
        let (_, session) = send(&server.app, get(&format!("/api/status/{id}"))).await;
        if !session["logs"].as_array().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let (status, body) = send(&server.app, post_json(&format!("/api/stop/{id}"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(server.driver.close_calls.load(Ordering::SeqCst) >= 1);

    let (status, _) = send(&server.app, get(&format!("/api/status/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The background task winds down without resurrecting the session.
    tokio::time::sleep(Duration::from_secs(15)).await;
    let (_, sessions) = send(&server.app, get("/api/sessions")).await;
    assert_eq!(sessions, json!([]));
}

#[tokio::test(start_paused = true)]
async fn test_second_start_fails_session_while_first_keeps_running() {
    let server = test_server();

    let (_, first) = send(&server.app, post_json("/api/start", json!({"url": VALID_URL}))).await;
    let first_id = first["sessionId"].as_str().unwrap().to_string();

    // Give the first run time to take the single-flight slot.
    for _ in 0..60 {
        if server.state.controller.is_running() {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let (status, second) =
        send(&server.app, post_json("/api/start", json!({"url": VALID_URL}))).await;
    assert_eq!(status, StatusCode::OK);
    let second_id = second["sessionId"].as_str().unwrap().to_string();

    let session = wait_for_status(&server.app, &second_id, "failed").await;
    let logs = session["logs"].as_array().unwrap();
    assert!(
        logs.iter().any(|l| l["type"] == json!("error")
            && l["message"] == json!("Error occurred: A video is already playing"))
    );

    let (_, first_session) = send(&server.app, get(&format!("/api/status/{first_id}"))).await;
    assert_eq!(first_session["status"], json!("running"));

    send(&server.app, post_json(&format!("/api/stop/{first_id}"), json!({}))).await;
}

#[tokio::test(start_paused = true)]
async fn test_health_and_sessions() {
    let server = test_server();
    script_completion(&server.driver.page);

    let (_, body) = send(&server.app, post_json("/api/start", json!({"url": VALID_URL}))).await;
    let id = body["sessionId"].as_str().unwrap().to_string();
    wait_for_status(&server.app, &id, "completed").await;

    let (status, sessions) = send(&server.app, get("/api/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = sessions.as_array().unwrap().clone();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], json!(id));

    let (status, health) = send(&server.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], json!("ok"));
    assert_eq!(health["activeSessions"], json!(0));
}

#[tokio::test(start_paused = true)]
async fn test_serves_embedded_ui() {
    let server = test_server();

    let response = server.app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("TubePilot"));

    let response = server.app.clone().oneshot(get("/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.app.clone().oneshot(get("/style.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
