//! Automation controller.
//!
//! Top-level state machine for one run: validate, acquire the single-flight
//! flag, then drive browser init, navigation, interstitial dismissal,
//! playback trigger and the monitor in strict sequence. Fatal phase errors
//! are logged at error level and returned to the caller with the flag
//! cleared; step-level failures inside a phase stay inside that phase.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::error::AutomationError;
use crate::interstitial::dismiss_interstitials;
use crate::monitor::{MonitorConfig, MonitorOutcome, PlaybackMonitor};
use crate::page::BrowserDriver;
use crate::progress::ProgressSink;
use crate::trigger::trigger_playback;
use crate::validate;

/// Pause after navigation so the player finishes rendering before we poke it.
const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// How a run that was accepted finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Playback finished, either by ending or by exhausting the wait budget.
    Completed,
    /// The run was stopped externally; the stop path owns the terminal state.
    Stopped,
}

pub struct AutomationController {
    driver: Arc<dyn BrowserDriver>,
    monitor: PlaybackMonitor,
    running: Arc<AtomicBool>,
}

impl AutomationController {
    pub fn new(driver: Arc<dyn BrowserDriver>, monitor_config: MonitorConfig) -> Self {
        Self {
            driver,
            monitor: PlaybackMonitor::new(monitor_config),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the full playback flow for one URL.
    ///
    /// Rejects synchronously with a validation error for unrecognized URLs
    /// and with a concurrency error when a run is already active; neither
    /// touches the browser. Once accepted, progress is reported through the
    /// sink and the run flag is cleared on every exit path.
    pub async fn play(
        &self,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<RunOutcome, AutomationError> {
        validate::validate_video_url(url)?;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AutomationError::Concurrency);
        }
        debug!(url, "automation run accepted");

        let result = self.drive(url, sink).await;
        if let Err(e) = &result {
            sink.error(&format!("Error occurred: {e}"));
        }
        self.running.store(false, Ordering::SeqCst);

        debug!(ok = result.is_ok(), "automation run finished");
        result
    }

    async fn drive(
        &self,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<RunOutcome, AutomationError> {
        sink.info("Initializing browser...");
        let page = self
            .driver
            .ensure_open()
            .await
            .map_err(AutomationError::Initialization)?;

        sink.info("Navigating to the video page...");
        page.open(url).await.map_err(AutomationError::Navigation)?;

        tokio::time::sleep(SETTLE_DELAY).await;

        dismiss_interstitials(page.as_ref(), sink).await;

        sink.info("Starting video playback...");
        trigger_playback(page.as_ref(), sink).await;

        match self.monitor.run(page.as_ref(), sink, &self.running).await {
            MonitorOutcome::Ended | MonitorOutcome::TimedOut => {
                sink.success("Video playback completed.");
                Ok(RunOutcome::Completed)
            }
            MonitorOutcome::Stopped => Ok(RunOutcome::Stopped),
        }
    }

    /// Stop the active run, if any, and close the browser. Idempotent.
    ///
    /// Cancellation is cooperative: the monitor notices the cleared flag at
    /// its next tick. The browser handle is closed regardless of loop state.
    pub async fn stop(&self) {
        debug!("stop requested");
        self.running.store(false, Ordering::SeqCst);
        self.driver.close().await;
    }

    /// Process-shutdown teardown; same as [`stop`](Self::stop) and always
    /// safe to call, even when nothing ever ran.
    pub async fn cleanup(&self) {
        self.stop().await;
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
