//! Video playback automation pipeline.
//!
//! Drives a browser page through the full watch flow: validate the URL,
//! navigate, clear ads and popups, start playback and watch it until the
//! video ends, the wait budget runs out or the run is stopped. Progress is
//! reported through a [`progress::ProgressSink`] so callers can stream logs
//! to whoever is watching.

pub mod controller;
pub mod error;
pub mod interstitial;
pub mod monitor;
pub mod page;
pub mod progress;
pub mod trigger;
pub mod validate;

pub use controller::{AutomationController, RunOutcome};
pub use error::AutomationError;
pub use tubepilot_browser::BrowserError;
pub use monitor::{MonitorConfig, MonitorOutcome, PlaybackMonitor};
pub use page::{BrowserDriver, VideoPage};
pub use progress::{LogLevel, ProgressSink};
