//! Position sampling loop
//!
//! The sampler subscribes to a [`LocationProvider`] and delivers a lazy,
//! effectively infinite sequence of [`PositionSample`] values through a
//! consumer-supplied handler, on a configured cadence.
//!
//! ## Behavior
//!
//! - Each cycle delivers the provider's most recent known fix at callback
//!   time. A cycle with no resolved fix is skipped silently.
//! - No two deliveries fire closer together than `min_interval_ms`, which
//!   shields downstream dispatch from update bursts.
//! - With a nonzero `min_distance_meters`, deliveries below that
//!   displacement are skipped; the default 0 reports even when stationary.
//! - With `wait_for_high_accuracy`, the first delivery is held back until
//!   a fix within the tier's error bound resolves.
//!
//! The sequence is non-restartable: [`PositionSampler::run`] consumes the
//! sampler. Cancellation is dropping the returned future; there is no
//! separate stop surface.

pub mod provider;
pub mod providers;

pub use provider::{FixCell, LocationProvider, UpdateRequest};

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::types::{distance_m, PositionSample};

/// Cadence-driven position sampler
pub struct PositionSampler {
    config: SamplerConfig,
    provider: Arc<dyn LocationProvider>,
}

impl PositionSampler {
    /// Create a sampler over the given provider
    pub fn new(config: SamplerConfig, provider: Arc<dyn LocationProvider>) -> Self {
        Self { config, provider }
    }

    /// Run the sampling loop, delivering samples to `on_sample`
    ///
    /// Starts provider updates, then ticks at `sampling_interval_ms`
    /// indefinitely, returning only once `max_samples` is reached (never,
    /// by default). The handler must not block; dispatch work belongs on
    /// its own task (see the reporter).
    pub async fn run<F>(self, mut on_sample: F) -> Result<()>
    where
        F: FnMut(PositionSample),
    {
        self.config.validate()?;
        self.provider.start_updates(UpdateRequest {
            accuracy: self.config.desired_accuracy,
        })?;

        tracing::info!(
            interval_ms = self.config.sampling_interval_ms,
            min_interval_ms = self.config.min_interval_ms,
            min_distance_m = self.config.min_distance_meters,
            "Sampling started"
        );

        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.sampling_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let min_interval = Duration::from_millis(self.config.min_interval_ms);
        let mut last_delivery: Option<(Instant, PositionSample)> = None;
        let mut delivered: u64 = 0;
        let mut waiting_for_accuracy = self.config.wait_for_high_accuracy;

        loop {
            ticker.tick().await;

            let Some(fix) = self.provider.last_fix() else {
                tracing::trace!("no fix available, skipping cycle");
                continue;
            };

            if waiting_for_accuracy {
                if !fix.meets(self.config.desired_accuracy) {
                    tracing::trace!(accuracy_m = ?fix.accuracy_m, "waiting for accurate fix");
                    continue;
                }
                waiting_for_accuracy = false;
            }

            if let Some((at, prev)) = last_delivery {
                if at.elapsed() < min_interval {
                    continue;
                }
                if self.config.min_distance_meters > 0.0 {
                    let moved =
                        distance_m(prev.latitude, prev.longitude, fix.latitude, fix.longitude);
                    if moved < self.config.min_distance_meters {
                        tracing::trace!(moved_m = moved, "below minimum displacement");
                        continue;
                    }
                }
            }

            let sample = PositionSample::from_fix(&fix);
            on_sample(sample);
            last_delivery = Some((Instant::now(), sample));
            delivered += 1;

            if let Some(max) = self.config.max_samples {
                if delivered >= max {
                    tracing::info!(delivered, "Sample cap reached, sampling stopped");
                    return Ok(());
                }
            }
        }
    }
}
