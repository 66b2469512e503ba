//! HTTP and WebSocket surface for the automation service.
//!
//! Accepts playback requests, tracks sessions in memory, streams progress
//! logs to subscribers in real time and serves the embedded control UI.
//! The automation itself lives in `tubepilot-automation`; this crate only
//! glues it to the outside world.

pub mod error;
pub mod events;
pub mod handlers;
pub mod logsink;
pub mod routes;
pub mod server;
pub mod session;
pub mod sink;
pub mod state;
pub mod websocket;

pub use error::ApiError;
pub use events::LogEvent;
pub use logsink::FileLogSink;
pub use server::{ServerConfig, serve};
pub use session::{LogEntry, Session, SessionRegistry, SessionStatus};
pub use sink::SessionSink;
pub use state::AppState;
