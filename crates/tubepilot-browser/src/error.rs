//! Error types for the CDP transport and the browser handle.

use thiserror::Error;

/// CDP transport errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to Chrome.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Chrome not reachable on the debugging endpoint.
    #[error("Chrome not available at {0}")]
    ChromeNotAvailable(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Error response from the protocol itself.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error during endpoint discovery.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Navigation failed.
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Element not found or not clickable.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// JavaScript threw inside the page.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// Request or wait timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The session's response channel was dropped.
    #[error("Session closed")]
    SessionClosed,

    /// Response was missing an expected field.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

/// Errors surfaced by [`crate::BrowserHandle`].
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No Chrome executable could be located.
    #[error("Chrome executable not found; install Chrome/Chromium or pass an explicit path")]
    ChromeNotFound,

    /// Chrome could not be spawned or never became ready.
    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    /// The debugging endpoint refused the connection.
    #[error("DevTools endpoint not reachable: {0}")]
    EndpointUnreachable(String),

    /// Page navigation failed or timed out.
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// In-page script evaluation failed.
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// A browser operation exceeded its deadline.
    #[error("Browser operation timed out: {0}")]
    Timeout(String),

    /// Any other protocol-level failure.
    #[error("Browser protocol error: {0}")]
    Protocol(String),
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::NavigationFailed(m) => BrowserError::Navigation(m),
            CdpError::JavaScript(m) => BrowserError::Evaluation(m),
            CdpError::Timeout(m) => BrowserError::Timeout(m),
            CdpError::ConnectionFailed(m) | CdpError::ChromeNotAvailable(m) => {
                BrowserError::EndpointUnreachable(m)
            }
            other => BrowserError::Protocol(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdp_error_maps_to_browser_error() {
        let e: BrowserError = CdpError::NavigationFailed("net::ERR_FAILED".to_string()).into();
        assert!(matches!(e, BrowserError::Navigation(_)));

        let e: BrowserError = CdpError::JavaScript("boom".to_string()).into();
        assert!(matches!(e, BrowserError::Evaluation(_)));

        let e: BrowserError = CdpError::SessionClosed.into();
        assert!(matches!(e, BrowserError::Protocol(_)));
    }

    #[test]
    fn test_error_display_includes_detail() {
        let e = CdpError::Protocol {
            code: -32000,
            message: "Could not compute box model".to_string(),
        };
        let text = e.to_string();
        assert!(text.contains("-32000"));
        assert!(text.contains("box model"));
    }
}
