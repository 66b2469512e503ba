//! Automation error taxonomy.
//!
//! Only failures that end a run are represented here. Errors inside a single
//! step of the pipeline (an ad click that misses, one bad poll) are reported
//! as warnings through the progress sink and the run keeps going.

use thiserror::Error;
use tubepilot_browser::BrowserError;

#[derive(Debug, Error)]
pub enum AutomationError {
    /// The submitted URL is missing or not a recognized video URL.
    #[error("Invalid video URL: {0}")]
    Validation(String),

    /// Another run is already in flight on this controller.
    #[error("A video is already playing")]
    Concurrency,

    /// The browser could not be launched or attached to.
    #[error("Browser initialization failed: {0}")]
    Initialization(#[source] BrowserError),

    /// The page never reached the video URL.
    #[error("Navigation failed: {0}")]
    Navigation(#[source] BrowserError),
}
