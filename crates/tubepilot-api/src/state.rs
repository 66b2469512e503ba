//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tubepilot_automation::AutomationController;

use crate::events::{LOG_CHANNEL_CAPACITY, LogEvent};
use crate::logsink::FileLogSink;
use crate::session::SessionRegistry;
use crate::sink::SessionSink;

/// Everything the HTTP layer shares across requests.
pub struct AppState {
    pub controller: Arc<AutomationController>,
    pub registry: Arc<SessionRegistry>,
    pub log_sink: Arc<FileLogSink>,
    pub events: broadcast::Sender<LogEvent>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(controller: Arc<AutomationController>, log_sink: Arc<FileLogSink>) -> Self {
        let (events, _) = broadcast::channel(LOG_CHANNEL_CAPACITY);
        Self {
            controller,
            registry: Arc::new(SessionRegistry::new()),
            log_sink,
            events,
            start_time: Instant::now(),
        }
    }

    /// Seconds since the server started.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Subscribe to the real-time log feed.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events.subscribe()
    }

    /// Sink wiring one session's progress into every consumer.
    pub fn session_sink(&self, session_id: &str) -> SessionSink {
        SessionSink::new(
            session_id.to_string(),
            Arc::clone(&self.registry),
            Arc::clone(&self.log_sink),
            self.events.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tubepilot_automation::{
        BrowserDriver, BrowserError, LogLevel, MonitorConfig, ProgressSink, VideoPage,
    };

    use super::*;

    struct NoBrowser;

    #[async_trait]
    impl BrowserDriver for NoBrowser {
        async fn ensure_open(&self) -> Result<Arc<dyn VideoPage>, BrowserError> {
            Err(BrowserError::ChromeNotFound)
        }

        async fn close(&self) {}
    }

    fn test_state(dir: &TempDir) -> AppState {
        let controller = Arc::new(AutomationController::new(
            Arc::new(NoBrowser),
            MonitorConfig::default(),
        ));
        let log_sink = Arc::new(FileLogSink::new(dir.path()).unwrap());
        AppState::new(controller, log_sink)
    }

    #[test]
    fn test_new_state_is_empty() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        assert!(state.registry.is_empty());
        assert!(!state.controller.is_running());
    }

    #[test]
    fn test_session_sink_feeds_subscribers() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let mut rx = state.subscribe();

        let id = state.registry.create("https://youtu.be/abc123");
        state
            .session_sink(&id)
            .emit(LogLevel::Info, "Initializing browser...");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.session_id, id);
        assert_eq!(event.message, "Initializing browser...");
        assert_eq!(state.registry.get(&id).unwrap().logs.len(), 1);
    }
}
