//! Managed browser handle.
//!
//! Owns the Chrome process, the CDP connection and the single automation
//! page. Opening is idempotent and closing is safe to repeat, so callers can
//! drive the handle from both the normal flow and shutdown paths.

use std::sync::Arc;

use tokio::process::Child;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::CdpClient;
use crate::config::BrowserConfig;
use crate::error::BrowserError;
use crate::launcher;
use crate::session::PageSession;

pub struct BrowserHandle {
    config: BrowserConfig,
    client: RwLock<Option<Arc<CdpClient>>>,
    page: RwLock<Option<Arc<PageSession>>>,
    chrome: RwLock<Option<Child>>,
}

impl BrowserHandle {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            page: RwLock::new(None),
            chrome: RwLock::new(None),
        }
    }

    /// Currently attached page, if any.
    pub async fn page(&self) -> Option<Arc<PageSession>> {
        self.page.read().await.clone()
    }

    /// Open the automation page, reusing an existing one when attached.
    ///
    /// Launches Chrome only when the DevTools endpoint is not already
    /// answering, then connects, creates a page and applies the configured
    /// user agent and viewport.
    pub async fn ensure_open(&self) -> Result<Arc<PageSession>, BrowserError> {
        if let Some(page) = self.page.read().await.clone() {
            debug!(target_id = page.target_id(), "reusing existing page session");
            return Ok(page);
        }

        let endpoint = self.config.endpoint();
        if !launcher::endpoint_alive(&endpoint).await {
            let child = launcher::launch_chrome(&self.config).await?;
            *self.chrome.write().await = Some(child);
            launcher::wait_until_ready(&endpoint).await?;
        } else {
            debug!(endpoint, "attaching to already-running chrome");
        }

        let client = Arc::new(CdpClient::connect(&endpoint).await?);
        let page = Arc::new(client.new_page().await?);
        page.set_user_agent(&self.config.user_agent).await?;
        page.set_viewport(self.config.viewport_width, self.config.viewport_height)
            .await?;

        *self.client.write().await = Some(client);
        *self.page.write().await = Some(Arc::clone(&page));
        info!(target_id = page.target_id(), "browser page ready");
        Ok(page)
    }

    /// Close the page and shut Chrome down. Safe to call repeatedly.
    pub async fn close(&self) {
        let page = self.page.write().await.take();
        let client = self.client.write().await.take();

        if let (Some(page), Some(client)) = (&page, &client) {
            if let Err(e) = client.close_page(page.target_id()).await {
                debug!(error = %e, "failed to close page target");
            }
        }
        drop(page);
        drop(client);

        if let Some(mut child) = self.chrome.write().await.take() {
            match child.kill().await {
                Ok(()) => info!("chrome process stopped"),
                Err(e) => warn!(error = %e, "failed to kill chrome process"),
            }
        }
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
