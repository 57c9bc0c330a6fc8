//! Chromium-backed document handles
//!
//! The session owns the browser process and the CDP handler task. Pages
//! opened through it are wrapped as [`Document`]s; the pipeline never
//! touches chromiumoxide types directly.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::ViewportConfig;
use super::document::{Document, PageOpener};
use super::harvest_error::{HarvestError, HarvestResult};

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";
const VIEWPORT_HEIGHT_JS: &str = "window.innerHeight";

/// A live Chromium tab
pub struct ChromiumDocument {
    page: Page,
}

impl ChromiumDocument {
    pub const fn new(page: Page) -> Self {
        Self { page }
    }

    async fn run_script(&self, operation: &str, script: &str) -> HarvestResult<()> {
        self.page
            .evaluate(script)
            .await
            .map(|_| ())
            .map_err(|e| HarvestError::document_unavailable(operation, e))
    }
}

#[async_trait]
impl Document for ChromiumDocument {
    async fn scroll_by(&self, pixels: u32) -> HarvestResult<()> {
        self.run_script("scroll_by", &format!("window.scrollBy(0, {pixels})")).await
    }

    async fn scroll_to_bottom(&self) -> HarvestResult<()> {
        self.run_script("scroll_to_bottom", SCROLL_TO_BOTTOM_JS).await
    }

    async fn viewport_height(&self) -> HarvestResult<u32> {
        let height: f64 = self
            .page
            .evaluate(VIEWPORT_HEIGHT_JS)
            .await
            .map_err(|e| HarvestError::document_unavailable("viewport_height", e))?
            .into_value()
            .map_err(|e| HarvestError::document_unavailable("viewport_height", e))?;

        if !height.is_finite() || height < 0.0 {
            return Err(HarvestError::document_unavailable(
                "viewport_height",
                format!("unexpected viewport height {height}"),
            ));
        }
        Ok(height as u32)
    }

    async fn content(&self) -> HarvestResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| HarvestError::document_unavailable("content", e))
    }

    async fn url(&self) -> HarvestResult<String> {
        self.page
            .url()
            .await
            .map_err(|e| HarvestError::document_unavailable("url", e))?
            .ok_or_else(|| HarvestError::document_unavailable("url", "page has no URL"))
    }
}

/// A running browser plus the task driving its CDP connection
pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromiumSession {
    pub async fn launch(viewport: &ViewportConfig, headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder().window_size(viewport.width, viewport.height);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("Invalid browser configuration: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chromium")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        info!("🌐 Chromium launched (headless: {})", headless);
        Ok(Self { browser, handler_task })
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process wait failed: {}", e);
        }
        self.handler_task.abort();
        Ok(())
    }
}

#[async_trait]
impl PageOpener for ChromiumSession {
    async fn open(&self, url: &str, viewport: &ViewportConfig) -> HarvestResult<Box<dyn Document>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| HarvestError::document_unavailable("open", e))?;

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|e| HarvestError::document_unavailable("open", e))?;
        page.execute(metrics)
            .await
            .map_err(|e| HarvestError::document_unavailable("open", e))?;

        page.goto(url)
            .await
            .map_err(|e| HarvestError::document_unavailable("navigate", e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| HarvestError::document_unavailable("navigate", e))?;

        debug!("Opened {} at {}x{}", url, viewport.width, viewport.height);
        Ok(Box::new(ChromiumDocument::new(page)))
    }
}
