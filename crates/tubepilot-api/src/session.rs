//! In-memory session registry.
//!
//! One [`Session`] per accepted start request, keyed by a collision-resistant
//! id. Sessions finishing naturally stay queryable; an explicit stop removes
//! them. Status transitions are monotonic: once a session leaves `running`
//! it never changes again.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tubepilot_automation::LogLevel;
use uuid::Uuid;

/// Lifecycle of one automation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
    Stopped,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

/// One log line attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    #[serde(rename = "type")]
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
}

/// One automation run and its tracked history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub url: String,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub logs: Vec<LogEntry>,
}

/// Process-wide registry of sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session in `running` state and return its id.
    pub fn create(&self, url: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session {
            id: id.clone(),
            url: url.to_string(),
            status: SessionStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            logs: Vec::new(),
        };
        self.sessions.insert(id.clone(), session);
        id
    }

    /// Snapshot of one session.
    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|s| s.clone())
    }

    /// Remove a session, returning its final snapshot.
    pub fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.remove(id).map(|(_, s)| s)
    }

    /// Append a log line to a session, if it still exists.
    pub fn append_log(&self, id: &str, level: LogLevel, message: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.logs.push(LogEntry {
                message: message.to_string(),
                level,
                timestamp: Utc::now(),
            });
        }
    }

    /// Move a session to a terminal status and stamp its end time.
    ///
    /// Returns false when the session is unknown or already terminal; the
    /// earlier terminal state wins.
    pub fn finish(&self, id: &str, status: SessionStatus) -> bool {
        debug_assert!(status.is_terminal());
        match self.sessions.get_mut(id) {
            Some(mut session) if !session.status.is_terminal() => {
                session.status = status;
                session.end_time = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    /// All sessions, newest first.
    pub fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.iter().map(|s| s.clone()).collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));
        sessions
    }

    /// Sessions still in `running` state.
    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Running)
            .count()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
