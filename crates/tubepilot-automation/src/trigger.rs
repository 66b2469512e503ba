//! Playback trigger.

use std::time::Duration;

use crate::page::VideoPage;
use crate::progress::ProgressSink;

/// Play control strategies, tried in order; first match wins.
///
/// Localized labels come first because the player surfaces them on localized
/// pages, then the stock player classes, then title-attribute fallbacks.
pub const PLAY_SELECTORS: [&str; 6] = [
    r#"button[aria-label*="재생"]"#,
    r#"button[aria-label*="Play"]"#,
    ".ytp-play-button",
    ".ytp-large-play-button",
    r#"button[title*="재생"]"#,
    r#"button[title*="Play"]"#,
];

const PLAY_SETTLE: Duration = Duration::from_secs(2);
const AUTOPLAY_WAIT: Duration = Duration::from_secs(5);

/// Try each play-control strategy in order and click the first match.
///
/// When no strategy matches, logs a warning and waits a longer fallback
/// delay for autoplay to kick in. Failures are absorbed at warning level;
/// this phase never fails the run.
pub async fn trigger_playback(page: &dyn VideoPage, sink: &dyn ProgressSink) {
    for selector in PLAY_SELECTORS {
        match page.click_selector(selector).await {
            Ok(true) => {
                sink.success("Clicked the play button.");
                tokio::time::sleep(PLAY_SETTLE).await;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                sink.warning(&format!("Playback trigger error: {e}"));
                return;
            }
        }
    }

    sink.warning("Play button not found. Waiting for autoplay...");
    tokio::time::sleep(AUTOPLAY_WAIT).await;
}
