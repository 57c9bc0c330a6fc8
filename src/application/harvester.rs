//! Harvest pipeline: scroll, extract, validate, assemble
//!
//! Stages run strictly in sequence against one document. A failure at any
//! stage ends the run; partial sequences are never assembled.

use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::record_assembler::RecordAssembler;
use super::scroll_driver::ScrollDriver;
use super::validated_config::ValidatedScrollSettings;
use crate::domain::{WishlistField, WishlistSnapshot};
use crate::infrastructure::config::{HarvestConfig, ScrollConfig};
use crate::infrastructure::document::Document;
use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};
use crate::infrastructure::parsing::FieldExtractor;

/// Runs the full pipeline against a loaded wishlist document.
///
/// Holds only immutable, validated settings and compiled selectors, so one
/// harvester may serve concurrent runs on distinct documents.
#[derive(Debug)]
pub struct WishlistHarvester {
    scroll: ScrollConfig,
    settings: ValidatedScrollSettings,
    extractor: FieldExtractor,
    assembler: RecordAssembler,
    run_timeout: Duration,
}

impl WishlistHarvester {
    /// Validate the configuration and compile every selector
    pub fn new(config: &HarvestConfig) -> HarvestResult<Self> {
        config.validate()?;
        let extractor = FieldExtractor::new(&config.selectors)?;
        let settings = ValidatedScrollSettings::from_config(&config.scroll, None);
        settings.log_config();

        Ok(Self {
            scroll: config.scroll.clone(),
            settings,
            extractor,
            assembler: RecordAssembler::new(),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
        })
    }

    /// Override the configured scroll round count for this harvester
    #[must_use]
    pub fn with_scroll_iterations(mut self, iterations: u32) -> Self {
        self.settings = ValidatedScrollSettings::from_config(&self.scroll, Some(iterations));
        self.settings.log_config();
        self
    }

    pub const fn settings(&self) -> &ValidatedScrollSettings {
        &self.settings
    }

    pub const fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Harvest one snapshot under the run deadline
    pub async fn harvest(&self, document: &dyn Document, cancel: CancellationToken) -> HarvestResult<WishlistSnapshot> {
        let run_id = Uuid::new_v4();
        let span = info_span!("harvest", %run_id);

        let outcome = tokio::time::timeout(self.run_timeout, self.run_stages(document, &cancel))
            .instrument(span)
            .await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!("⏰ Harvest {} timed out after {:?}", run_id, self.run_timeout);
                Err(HarvestError::TimedOut {
                    after_secs: self.run_timeout.as_secs(),
                })
            }
        }
    }

    async fn run_stages(&self, document: &dyn Document, cancel: &CancellationToken) -> HarvestResult<WishlistSnapshot> {
        let started = Instant::now();
        let driver = ScrollDriver::new(self.settings.step, self.settings.settle_delay()).with_cancellation(cancel.clone());

        match self.settings.quiet_rounds {
            Some(quiet_rounds) => {
                let outcome = driver
                    .advance_until_stable(document, self.settings.iterations, quiet_rounds, |html| {
                        self.extractor.count_items(html)
                    })
                    .await?;
                info!(
                    "📜 Scrolled {} rounds (converged: {}, visible items: {}) in {:?}",
                    outcome.rounds,
                    outcome.converged,
                    outcome.probe_count,
                    started.elapsed()
                );
            }
            None => {
                driver.advance(document, self.settings.iterations).await?;
                info!("📜 Scrolled {} rounds in {:?}", self.settings.iterations, started.elapsed());
            }
        }

        let extraction_started = Instant::now();
        let sequences = tokio::select! {
            () = cancel.cancelled() => return Err(HarvestError::Cancelled),
            result = self.extractor.extract_all(document) => result?,
        };
        info!(
            "🔍 Extracted {} names in {:?}",
            sequences.len_of(WishlistField::Name),
            extraction_started.elapsed()
        );

        let snapshot = self.assembler.assemble(&sequences, Utc::now())?;
        info!("✅ Harvested {} items in {:?}", snapshot.item_count(), started.elapsed());

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ConvergenceConfig;
    use crate::infrastructure::scripted_document::{DocumentCall, ScriptedDocument};
    use crate::test_utils::{render_wishlist_page, sample_items};

    const URL: &str = "https://www.example.com/hz/wishlist/ls/ABC";

    #[tokio::test(start_paused = true)]
    async fn test_harvest_round_trips_rendered_items() {
        let items = sample_items(3);
        let document = ScriptedDocument::new(URL, render_wishlist_page(&items));
        let harvester = WishlistHarvester::new(&HarvestConfig::default()).unwrap();

        let snapshot = harvester.harvest(&document, CancellationToken::new()).await.unwrap();

        assert_eq!(snapshot.items(), items.as_slice());
        assert_eq!(document.scroll_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_rounds_jump_to_document_bottom() {
        let document = ScriptedDocument::new(URL, render_wishlist_page(&sample_items(1)));
        let harvester = WishlistHarvester::new(&HarvestConfig::default()).unwrap();

        harvester.harvest(&document, CancellationToken::new()).await.unwrap();

        let scrolls: Vec<DocumentCall> = document.scroll_calls().iter().map(|c| c.call).collect();
        assert_eq!(scrolls, vec![DocumentCall::ScrollToBottom, DocumentCall::ScrollToBottom]);
        assert!(!document.calls().iter().any(|c| c.call == DocumentCall::ViewportHeight));
    }

    #[test]
    fn test_scroll_override_is_clamped() {
        let harvester = WishlistHarvester::new(&HarvestConfig::default())
            .unwrap()
            .with_scroll_iterations(5_000);

        assert_eq!(harvester.settings().iterations, 100);
    }

    #[test]
    fn test_invalid_config_fails_before_document_access() {
        let mut config = HarvestConfig::default();
        config.scroll.settle_delay_ms = 0;

        let err = WishlistHarvester::new(&config).unwrap_err();
        assert!(matches!(err, HarvestError::InvalidConfig { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_timeout_yields_timed_out() {
        let mut config = HarvestConfig::default();
        config.scroll.iterations = 10;
        config.run_timeout_secs = 3;
        let harvester = WishlistHarvester::new(&config).unwrap();
        let document = ScriptedDocument::new(URL, render_wishlist_page(&sample_items(1)));

        let err = harvester.harvest(&document, CancellationToken::new()).await.unwrap_err();

        assert_eq!(err, HarvestError::TimedOut { after_secs: 3 });
        assert!(document.scroll_calls().len() < 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_run_produces_no_snapshot() {
        let harvester = WishlistHarvester::new(&HarvestConfig::default()).unwrap();
        let document = ScriptedDocument::new(URL, render_wishlist_page(&sample_items(2)));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = harvester.harvest(&document, cancel).await.unwrap_err();

        assert_eq!(err, HarvestError::Cancelled);
        assert!(document.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_convergence_picks_up_lazily_loaded_items() {
        let items = sample_items(6);
        let frames = vec![
            render_wishlist_page(&items[..2]),
            render_wishlist_page(&items[..4]),
            render_wishlist_page(&items),
        ];
        let document = ScriptedDocument::with_frames(URL, frames);

        let mut config = HarvestConfig::default();
        config.scroll.iterations = 20;
        config.scroll.convergence = Some(ConvergenceConfig { quiet_rounds: 1 });
        let harvester = WishlistHarvester::new(&config).unwrap();

        let snapshot = harvester.harvest(&document, CancellationToken::new()).await.unwrap();

        assert_eq!(snapshot.item_count(), 6);
        assert_eq!(document.scroll_calls().len(), 3);
    }
}
