//! Request/response entry point
//!
//! Accepts `{ wishlistUrl, scrollLoops }`, opens the page through a
//! [`PageOpener`], runs the harvest pipeline and answers with
//! `{ statusCode, body }`. Errors never escape as `Err`: they become a
//! status code plus a JSON error body.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

use super::harvester::WishlistHarvester;
use crate::domain::WishlistSnapshot;
use crate::infrastructure::config::{HarvestConfig, defaults};
use crate::infrastructure::document::PageOpener;
use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};

const fn default_scroll_loops() -> u32 {
    defaults::SCROLL_ITERATIONS
}

/// Incoming harvest request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestEvent {
    pub wishlist_url: String,
    #[serde(default = "default_scroll_loops")]
    pub scroll_loops: u32,
}

impl HarvestEvent {
    pub fn new(wishlist_url: impl Into<String>) -> Self {
        Self {
            wishlist_url: wishlist_url.into(),
            scroll_loops: default_scroll_loops(),
        }
    }

    #[must_use]
    pub const fn with_scroll_loops(mut self, scroll_loops: u32) -> Self {
        self.scroll_loops = scroll_loops;
        self
    }

    pub fn from_json(raw: &str) -> HarvestResult<Self> {
        serde_json::from_str(raw).map_err(|e| HarvestError::invalid_event(e.to_string()))
    }

    /// The wishlist URL must be an absolute http(s) URL
    pub fn validate(&self) -> HarvestResult<Url> {
        let url = Url::parse(self.wishlist_url.trim())
            .map_err(|e| HarvestError::invalid_event(format!("wishlistUrl '{}' is not a URL: {e}", self.wishlist_url)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(HarvestError::invalid_event(format!(
                "wishlistUrl must use http or https, got '{scheme}'"
            ))),
        }
    }
}

/// Outgoing response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    retryable: bool,
}

impl HandlerResponse {
    pub const fn ok(body: String) -> Self {
        Self { status_code: 200, body }
    }

    pub fn from_error(error: &HarvestError) -> Self {
        let message = error.to_string();
        let body = serde_json::to_string(&ErrorBody {
            error: &message,
            retryable: error.is_retryable(),
        })
        .unwrap_or_else(|_| format!("{{\"error\":{message:?},\"retryable\":false}}"));

        Self {
            status_code: status_for(error),
            body,
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// HTTP-style status for a pipeline failure
pub const fn status_for(error: &HarvestError) -> u16 {
    match error {
        HarvestError::InvalidEvent { .. } => 400,
        HarvestError::InconsistentLengths { .. } => 422,
        HarvestError::Cancelled => 499,
        HarvestError::DocumentUnavailable { .. } => 502,
        HarvestError::TimedOut { .. } => 504,
        HarvestError::InvalidSelector { .. } | HarvestError::InvalidConfig { .. } | HarvestError::Serialization { .. } => 500,
    }
}

/// Handles harvest events against pages from one opener
pub struct EventHandler {
    config: HarvestConfig,
    opener: Arc<dyn PageOpener>,
}

impl EventHandler {
    pub fn new(config: HarvestConfig, opener: Arc<dyn PageOpener>) -> Self {
        Self { config, opener }
    }

    pub async fn handle(&self, event: &HarvestEvent, cancel: CancellationToken) -> HandlerResponse {
        let result = self
            .run(event, cancel)
            .await
            .and_then(|snapshot| {
                snapshot.to_json_pretty().map_err(|e| HarvestError::Serialization { message: e.to_string() })
            });

        match result {
            Ok(body) => HandlerResponse::ok(body),
            Err(e) => {
                error!("❌ Harvest of {} failed: {}", event.wishlist_url, e);
                if let Some(iterations) = e.suggested_scroll_iterations(event.scroll_loops) {
                    info!("💡 Retrying with scrollLoops={} may load the remaining items", iterations);
                }
                HandlerResponse::from_error(&e)
            }
        }
    }

    /// Handle a raw JSON event; unparsable events get a 400
    pub async fn handle_json(&self, raw: &str, cancel: CancellationToken) -> HandlerResponse {
        match HarvestEvent::from_json(raw) {
            Ok(event) => self.handle(&event, cancel).await,
            Err(e) => HandlerResponse::from_error(&e),
        }
    }

    async fn run(&self, event: &HarvestEvent, cancel: CancellationToken) -> HarvestResult<WishlistSnapshot> {
        let url = event.validate()?;
        let harvester = WishlistHarvester::new(&self.config)?.with_scroll_iterations(event.scroll_loops);

        info!("🚀 Harvesting {} with {} scroll loops", url, harvester.settings().iterations);

        let document = tokio::select! {
            () = cancel.cancelled() => return Err(HarvestError::Cancelled),
            document = self.opener.open(url.as_str(), &self.config.viewport) => document?,
        };

        harvester.harvest(document.as_ref(), cancel).await
    }
}
