//! Document handle abstraction
//!
//! The pipeline never creates or destroys a page. It receives a live,
//! already-navigated document from the browser-automation side and only
//! scrolls it and reads its serialized DOM.

use async_trait::async_trait;

use super::config::ViewportConfig;
use super::harvest_error::HarvestResult;

/// A loaded, scrollable page.
///
/// Every operation fails with `DocumentUnavailable` once the page is
/// detached (navigation away, crash, closed tab).
#[async_trait]
pub trait Document: Send + Sync {
    /// Scroll vertically by a fixed number of CSS pixels
    async fn scroll_by(&self, pixels: u32) -> HarvestResult<()>;

    /// Scroll to the current bottom of the document body
    async fn scroll_to_bottom(&self) -> HarvestResult<()>;

    /// Height of the visible viewport in CSS pixels
    async fn viewport_height(&self) -> HarvestResult<u32>;

    /// Serialized live DOM
    async fn content(&self) -> HarvestResult<String>;

    /// Current document URL, used to resolve relative resource links
    async fn url(&self) -> HarvestResult<String>;
}

/// Opens documents for the event handler.
///
/// Implemented by the Chromium session for live runs and by the replay
/// opener for saved pages.
#[async_trait]
pub trait PageOpener: Send + Sync {
    async fn open(&self, url: &str, viewport: &ViewportConfig) -> HarvestResult<Box<dyn Document>>;
}
