//! Real-time log broadcast payloads.

use serde::{Deserialize, Serialize};
use tubepilot_automation::LogLevel;

/// Buffered events per subscriber before slow readers start skipping.
pub const LOG_CHANNEL_CAPACITY: usize = 256;

/// One log line fanned out to every connected subscriber.
///
/// The feed is not scoped to a session; clients filter by `sessionId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub message: String,
    #[serde(rename = "type")]
    pub level: LogLevel,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = LogEvent {
            message: "Video is playing...".to_string(),
            level: LogLevel::Info,
            session_id: "abc".to_string(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "message": "Video is playing...",
                "type": "info",
                "sessionId": "abc",
            })
        );
    }
}
