//! Chrome DevTools Protocol plumbing for TubePilot.
//!
//! This crate owns everything below the automation layer: finding and
//! launching a Chrome binary, speaking CDP over its debugging WebSocket, and
//! exposing the handful of page operations playback automation needs
//! (navigate, evaluate, query, click, emulation overrides).
//!
//! The central type is [`BrowserHandle`]: one Chrome process, one CDP client,
//! one page session, created lazily and torn down idempotently.

pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod launcher;
pub mod protocol;
pub mod session;

pub use client::CdpClient;
pub use config::BrowserConfig;
pub use error::{BrowserError, CdpError};
pub use handle::BrowserHandle;
pub use session::PageSession;
