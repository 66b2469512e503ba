//! Video URL validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::AutomationError;

/// Accepts watch-page and short-link forms, with or without scheme/www.
/// No trailing anchor, so extra query parameters are allowed.
static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/)[\w-]+")
        .expect("video URL pattern is valid")
});

/// Whether the string looks like a watchable video URL.
pub fn is_valid_video_url(url: &str) -> bool {
    VIDEO_URL.is_match(url)
}

/// Reject URLs that do not point at a video watch page.
pub fn validate_video_url(url: &str) -> Result<(), AutomationError> {
    if is_valid_video_url(url) {
        Ok(())
    } else {
        Err(AutomationError::Validation(url.to_string()))
    }
}
