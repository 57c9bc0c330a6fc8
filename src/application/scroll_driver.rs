//! Scroll driver for lazily loaded list pages
//!
//! Fixed-iteration scrolling with a settle delay after every step. There is
//! no feedback signal in [`ScrollDriver::advance`]; the optional
//! [`ScrollDriver::advance_until_stable`] probes the DOM between rounds and
//! stops early once the item count stops growing.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::infrastructure::config::{ScrollConfig, ScrollStep};
use crate::infrastructure::document::Document;
use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};

/// Result of a convergence-driven scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Scroll rounds actually performed
    pub rounds: u32,
    /// Probe count after the last round
    pub probe_count: usize,
    /// True when the run stopped because the count stayed flat
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct ScrollDriver {
    step: ScrollStep,
    settle_delay: Duration,
    cancel: CancellationToken,
}

impl ScrollDriver {
    pub fn new(step: ScrollStep, settle_delay: Duration) -> Self {
        Self {
            step,
            settle_delay,
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &ScrollConfig) -> Self {
        Self::new(config.step, Duration::from_millis(config.settle_delay_ms))
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Scroll `iterations` times, settling after each step.
    ///
    /// `iterations == 0` touches nothing. A detached document aborts the
    /// remaining iterations with `DocumentUnavailable`.
    pub async fn advance(&self, document: &dyn Document, iterations: u32) -> HarvestResult<()> {
        for round in 1..=iterations {
            self.round(document).await?;
            debug!("Scroll round {}/{} settled", round, iterations);
        }
        Ok(())
    }

    /// Scroll until `probe` reports the same count for `quiet_rounds`
    /// consecutive rounds, capped at `max_iterations`.
    pub async fn advance_until_stable<P>(
        &self,
        document: &dyn Document,
        max_iterations: u32,
        quiet_rounds: u32,
        probe: P,
    ) -> HarvestResult<ScrollOutcome>
    where
        P: Fn(&str) -> usize,
    {
        if max_iterations == 0 {
            return Ok(ScrollOutcome {
                rounds: 0,
                probe_count: 0,
                converged: false,
            });
        }

        let mut last_count = probe(&self.guarded(document.content()).await?);
        let mut quiet = 0;
        let mut rounds = 0;

        while rounds < max_iterations {
            self.round(document).await?;
            rounds += 1;

            let count = probe(&self.guarded(document.content()).await?);
            if count == last_count {
                quiet += 1;
            } else {
                quiet = 0;
                last_count = count;
            }
            debug!("Scroll round {}: probe count {} (quiet {}/{})", rounds, count, quiet, quiet_rounds);

            if quiet >= quiet_rounds {
                info!("📜 Item count stable at {} after {} rounds", count, rounds);
                return Ok(ScrollOutcome {
                    rounds,
                    probe_count: count,
                    converged: true,
                });
            }
        }

        Ok(ScrollOutcome {
            rounds,
            probe_count: last_count,
            converged: false,
        })
    }

    /// One step followed by the settle delay
    async fn round(&self, document: &dyn Document) -> HarvestResult<()> {
        if self.cancel.is_cancelled() {
            return Err(HarvestError::Cancelled);
        }

        match self.step {
            ScrollStep::HalfViewport => {
                let height = self.guarded(document.viewport_height()).await?;
                self.guarded(document.scroll_by(height / 2)).await?;
            }
            ScrollStep::FullDocument => self.guarded(document.scroll_to_bottom()).await?,
            ScrollStep::Pixels(pixels) => self.guarded(document.scroll_by(pixels)).await?,
        }

        tokio::select! {
            () = self.cancel.cancelled() => Err(HarvestError::Cancelled),
            () = tokio::time::sleep(self.settle_delay) => Ok(()),
        }
    }

    /// Race a document operation against cancellation
    async fn guarded<T>(&self, operation: impl Future<Output = HarvestResult<T>>) -> HarvestResult<T> {
        tokio::select! {
            () = self.cancel.cancelled() => Err(HarvestError::Cancelled),
            result = operation => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::scripted_document::{DocumentCall, ScriptedDocument};
    use tokio::time::Instant;

    const URL: &str = "https://www.example.com/hz/wishlist/ls/ABC";

    fn driver(step: ScrollStep) -> ScrollDriver {
        ScrollDriver::new(step, Duration::from_millis(1000))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_iterations_pace_every_scroll() {
        let document = ScriptedDocument::new(URL, "<html></html>").with_viewport_height(1080);
        let start = Instant::now();

        driver(ScrollStep::HalfViewport).advance(&document, 3).await.unwrap();

        let scrolls = document.scroll_calls();
        assert_eq!(scrolls.len(), 3);
        for (i, recorded) in scrolls.iter().enumerate() {
            assert_eq!(recorded.call, DocumentCall::ScrollBy(540));
            assert_eq!(recorded.at - start, Duration::from_millis(1000 * i as u64));
        }
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_iterations_is_a_no_op() {
        let document = ScriptedDocument::new(URL, "<html></html>");
        let start = Instant::now();

        driver(ScrollStep::FullDocument).advance(&document, 0).await.unwrap();

        assert!(document.calls().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_document_aborts_remaining_iterations() {
        let document = ScriptedDocument::new(URL, "<html></html>").detach_after(2);

        let err = driver(ScrollStep::Pixels(300)).advance(&document, 5).await.unwrap_err();

        assert!(matches!(err, HarvestError::DocumentUnavailable { .. }));
        assert_eq!(document.scroll_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_settle_delay() {
        let document = ScriptedDocument::new(URL, "<html></html>");
        let cancel = CancellationToken::new();
        let driver = driver(ScrollStep::FullDocument).with_cancellation(cancel.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            cancel.cancel();
        });

        let err = driver.advance(&document, 10).await.unwrap_err();
        canceller.await.unwrap();

        assert_eq!(err, HarvestError::Cancelled);
        assert_eq!(document.scroll_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_convergence_stops_after_quiet_rounds() {
        let frames = vec!["a".to_string(), "aa".to_string(), "aaa".to_string()];
        let document = ScriptedDocument::with_frames(URL, frames);

        let outcome = driver(ScrollStep::FullDocument)
            .advance_until_stable(&document, 20, 2, str::len)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ScrollOutcome {
                rounds: 4,
                probe_count: 3,
                converged: true
            }
        );
        assert_eq!(document.scroll_calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_convergence_respects_iteration_cap() {
        let frames = (1..=10).map(|n| "a".repeat(n)).collect();
        let document = ScriptedDocument::with_frames(URL, frames);

        let outcome = driver(ScrollStep::FullDocument)
            .advance_until_stable(&document, 3, 2, str::len)
            .await
            .unwrap();

        assert_eq!(outcome.rounds, 3);
        assert_eq!(outcome.probe_count, 4);
        assert!(!outcome.converged);

        let idle = ScriptedDocument::new(URL, "<html></html>");
        let outcome = driver(ScrollStep::FullDocument)
            .advance_until_stable(&idle, 0, 2, str::len)
            .await
            .unwrap();
        assert_eq!(outcome.rounds, 0);
        assert!(idle.calls().is_empty());
    }
}
