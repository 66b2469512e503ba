//! Browser seam for the automation pipeline.
//!
//! The pipeline drives the page through [`VideoPage`] and obtains pages
//! through [`BrowserDriver`]. Keeping the CDP plumbing behind these traits
//! lets tests substitute scripted pages for a real browser.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tubepilot_browser::{BrowserError, BrowserHandle, PageSession};

/// A browser page the pipeline can drive.
#[async_trait]
pub trait VideoPage: Send + Sync {
    /// Navigate to the URL and wait for the page to load.
    async fn open(&self, url: &str) -> Result<(), BrowserError>;

    /// Click the first element matching the selector.
    ///
    /// `Ok(true)` when an element was found and clicked, `Ok(false)` when
    /// nothing matched.
    async fn click_selector(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Evaluate a JavaScript expression and return its value.
    async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError>;
}

/// Hands out pages and owns the browser lifetime.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Open the automation page, reusing one that is already attached.
    async fn ensure_open(&self) -> Result<Arc<dyn VideoPage>, BrowserError>;

    /// Tear the browser down. Safe to call repeatedly.
    async fn close(&self);
}

#[async_trait]
impl VideoPage for PageSession {
    async fn open(&self, url: &str) -> Result<(), BrowserError> {
        self.navigate(url).await.map_err(BrowserError::from)
    }

    async fn click_selector(&self, selector: &str) -> Result<bool, BrowserError> {
        PageSession::click_selector(self, selector)
            .await
            .map_err(BrowserError::from)
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
        PageSession::evaluate(self, expression)
            .await
            .map_err(BrowserError::from)
    }
}

#[async_trait]
impl BrowserDriver for BrowserHandle {
    async fn ensure_open(&self) -> Result<Arc<dyn VideoPage>, BrowserError> {
        let page = BrowserHandle::ensure_open(self).await?;
        Ok(page as Arc<dyn VideoPage>)
    }

    async fn close(&self) {
        BrowserHandle::close(self).await;
    }
}
