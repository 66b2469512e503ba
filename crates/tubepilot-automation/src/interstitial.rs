//! Ad-skip and popup dismissal.

use std::time::Duration;

use crate::page::VideoPage;
use crate::progress::ProgressSink;

/// Matches skip controls across ad UI variants.
pub const SKIP_AD_SELECTOR: &str =
    r#"button[class*="skip"], .ytp-ad-skip-button, .ytp-ad-skip-button-modern"#;

/// Matches popup/dialog close controls, localized and generic labels.
pub const POPUP_CLOSE_SELECTOR: &str =
    r#"button[aria-label*="닫기"], button[aria-label*="Close"], .ytp-popup-close-button"#;

const SKIP_SETTLE: Duration = Duration::from_secs(2);
const POPUP_SETTLE: Duration = Duration::from_secs(1);

/// Best-effort dismissal of interstitials before playback.
///
/// The skip and popup attempts are independent; a failure in one is logged
/// at warning level and the other still runs. Never aborts the run. No-op
/// when neither control is present.
pub async fn dismiss_interstitials(page: &dyn VideoPage, sink: &dyn ProgressSink) {
    match page.click_selector(SKIP_AD_SELECTOR).await {
        Ok(true) => {
            sink.info("Skipping ad...");
            tokio::time::sleep(SKIP_SETTLE).await;
        }
        Ok(false) => {}
        Err(e) => sink.warning(&format!("Ad/popup handling error: {e}")),
    }

    match page.click_selector(POPUP_CLOSE_SELECTOR).await {
        Ok(true) => {
            sink.info("Closing popup...");
            tokio::time::sleep(POPUP_SETTLE).await;
        }
        Ok(false) => {}
        Err(e) => sink.warning(&format!("Ad/popup handling error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;
    use tubepilot_browser::BrowserError;

    use super::*;
    use crate::progress::LogLevel;

    #[derive(Default)]
    struct ClickPage {
        results: Mutex<VecDeque<Result<bool, BrowserError>>>,
        clicked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VideoPage for ClickPage {
        async fn open(&self, _url: &str) -> Result<(), BrowserError> {
            Ok(())
        }

        async fn click_selector(&self, selector: &str) -> Result<bool, BrowserError> {
            self.clicked.lock().push(selector.to_string());
            self.results.lock().pop_front().unwrap_or(Ok(false))
        }

        async fn evaluate(&self, _expression: &str) -> Result<Value, BrowserError> {
            Ok(Value::Bool(false))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl ProgressSink for RecordingSink {
        fn emit(&self, level: LogLevel, message: &str) {
            self.lines.lock().push((level, message.to_string()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_noop_when_nothing_matches() {
        let page = Arc::new(ClickPage::default());
        let sink = RecordingSink::default();

        dismiss_interstitials(page.as_ref(), &sink).await;

        assert!(sink.lines.lock().is_empty());
        assert_eq!(
            *page.clicked.lock(),
            vec![SKIP_AD_SELECTOR.to_string(), POPUP_CLOSE_SELECTOR.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_ad_and_closes_popup() {
        let page = Arc::new(ClickPage::default());
        page.results.lock().push_back(Ok(true));
        page.results.lock().push_back(Ok(true));
        let sink = RecordingSink::default();

        dismiss_interstitials(page.as_ref(), &sink).await;

        let lines = sink.lines.lock();
        assert_eq!(
            *lines,
            vec![
                (LogLevel::Info, "Skipping ad...".to_string()),
                (LogLevel::Info, "Closing popup...".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_failure_still_tries_popup() {
        let page = Arc::new(ClickPage::default());
        page.results
            .lock()
            .push_back(Err(BrowserError::Evaluation("detached frame".into())));
        page.results.lock().push_back(Ok(true));
        let sink = RecordingSink::default();

        dismiss_interstitials(page.as_ref(), &sink).await;

        let lines = sink.lines.lock();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, LogLevel::Warning);
        assert!(lines[0].1.starts_with("Ad/popup handling error:"));
        assert_eq!(lines[1], (LogLevel::Info, "Closing popup...".to_string()));
    }
}
