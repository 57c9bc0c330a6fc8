use std::time::Duration;
use tracing::{info, warn};

use crate::infrastructure::config::{ScrollConfig, ScrollStep, defaults};

/// Scroll settings clamped into their usable ranges.
///
/// Per-run overrides (an event's `scrollLoops`, the CLI flag) bypass config
/// validation, so they are clamped here instead of being trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedScrollSettings {
    /// Scroll rounds, at most `MAX_SCROLL_ITERATIONS`
    pub iterations: u32,
    /// Settle delay in milliseconds (1 to `MAX_SETTLE_DELAY_MS`)
    pub settle_delay_ms: u64,
    pub step: ScrollStep,
    /// Consecutive unchanged probes that end a convergence run
    pub quiet_rounds: Option<u32>,
}

impl ValidatedScrollSettings {
    pub fn from_config(config: &ScrollConfig, iterations_override: Option<u32>) -> Self {
        let requested = iterations_override.unwrap_or(config.iterations);
        let iterations = requested.min(defaults::MAX_SCROLL_ITERATIONS);
        if iterations != requested {
            warn!(
                "Scroll iterations {} exceed the limit, using {}",
                requested,
                defaults::MAX_SCROLL_ITERATIONS
            );
        }

        let settle_delay_ms = config.settle_delay_ms.clamp(1, defaults::MAX_SETTLE_DELAY_MS);

        let step = match config.step {
            ScrollStep::Pixels(0) => ScrollStep::HalfViewport,
            step => step,
        };

        Self {
            iterations,
            settle_delay_ms,
            step,
            quiet_rounds: config.convergence.as_ref().map(|c| c.quiet_rounds.max(1)),
        }
    }

    pub fn log_config(&self) {
        info!("🔧 Scroll settings applied:");
        info!("   iterations: {}", self.iterations);
        info!("   settle_delay_ms: {}", self.settle_delay_ms);
        info!("   step: {:?}", self.step);
        if let Some(quiet_rounds) = self.quiet_rounds {
            info!("   convergence quiet_rounds: {}", quiet_rounds);
        }
    }

    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
