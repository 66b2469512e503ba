//! Playback monitoring loop.
//!
//! Polls in-page media state at a fixed interval until the video ends, the
//! wait budget runs out or the run flag is cleared. One poll per tick: a
//! playing/paused line for whoever is watching the logs, then an end check
//! that decides whether the loop is done. Evaluation failures on a tick are
//! warnings, not aborts; the loop sleeps through them like any other tick,
//! so total runtime stays bounded by the wait budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tubepilot_browser::BrowserError;

use crate::page::VideoPage;
use crate::progress::ProgressSink;

const VIDEO_PLAYING_EXPR: &str = r#"(() => {
    const video = document.querySelector('video');
    if (!video) return false;
    return !video.paused && video.currentTime > 0;
})()"#;

const VIDEO_ENDED_EXPR: &str = r#"(() => {
    const video = document.querySelector('video');
    if (!video) return false;
    return video.ended;
})()"#;

/// Poll interval and total wait budget for one monitoring run.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
        }
    }
}

/// Why the monitoring loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The media element reported ended.
    Ended,
    /// The wait budget was exhausted first.
    TimedOut,
    /// The external run flag was cleared.
    Stopped,
}

pub struct PlaybackMonitor {
    config: MonitorConfig,
}

impl PlaybackMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Watch playback until it ends, times out or is stopped.
    ///
    /// Cancellation is cooperative: a cleared `running` flag takes effect at
    /// the next tick boundary, so stop latency is bounded by the poll
    /// interval.
    pub async fn run(
        &self,
        page: &dyn VideoPage,
        sink: &dyn ProgressSink,
        running: &AtomicBool,
    ) -> MonitorOutcome {
        let mut elapsed = Duration::ZERO;

        while elapsed < self.config.max_wait && running.load(Ordering::SeqCst) {
            match self.tick(page, sink).await {
                Ok(true) => return MonitorOutcome::Ended,
                Ok(false) => {}
                Err(e) => sink.warning(&format!("Playback monitoring error: {e}")),
            }
            tokio::time::sleep(self.config.poll_interval).await;
            elapsed += self.config.poll_interval;
        }

        if elapsed >= self.config.max_wait {
            sink.warning("Maximum wait time exceeded.");
            MonitorOutcome::TimedOut
        } else {
            MonitorOutcome::Stopped
        }
    }

    /// One poll: report playing/paused, then check for end of playback.
    async fn tick(
        &self,
        page: &dyn VideoPage,
        sink: &dyn ProgressSink,
    ) -> Result<bool, BrowserError> {
        let playing = page
            .evaluate(VIDEO_PLAYING_EXPR)
            .await?
            .as_bool()
            .unwrap_or(false);
        if playing {
            sink.info("Video is playing...");
        } else {
            sink.warning("Video playback is paused.");
        }

        let ended = page
            .evaluate(VIDEO_ENDED_EXPR)
            .await?
            .as_bool()
            .unwrap_or(false);
        if ended {
            sink.success("Video has ended.");
        }
        Ok(ended)
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
