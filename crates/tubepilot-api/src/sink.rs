//! Per-session progress fan-out.

use std::sync::Arc;

use tokio::sync::broadcast;
use tubepilot_automation::{LogLevel, ProgressSink};

use crate::events::LogEvent;
use crate::logsink::FileLogSink;
use crate::session::SessionRegistry;

/// Routes one run's progress lines to every consumer: the session's log
/// history, the dated log file, the real-time broadcast and the operator
/// log.
pub struct SessionSink {
    session_id: String,
    registry: Arc<SessionRegistry>,
    file: Arc<FileLogSink>,
    events: broadcast::Sender<LogEvent>,
}

impl SessionSink {
    pub fn new(
        session_id: String,
        registry: Arc<SessionRegistry>,
        file: Arc<FileLogSink>,
        events: broadcast::Sender<LogEvent>,
    ) -> Self {
        Self {
            session_id,
            registry,
            file,
            events,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl ProgressSink for SessionSink {
    fn emit(&self, level: LogLevel, message: &str) {
        self.registry.append_log(&self.session_id, level, message);
        self.file.append(Some(&self.session_id), level, message);

        // A send with no subscribers is fine; they come and go.
        let _ = self.events.send(LogEvent {
            message: message.to_string(),
            level,
            session_id: self.session_id.clone(),
        });

        match level {
            LogLevel::Error => tracing::error!(session = %self.session_id, "{message}"),
            LogLevel::Warning => tracing::warn!(session = %self.session_id, "{message}"),
            _ => tracing::info!(session = %self.session_id, "{message}"),
        }
    }
}
