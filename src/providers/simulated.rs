//! A simulated "live market": base rates nudged by a small random amount on
//! every refresh.
use crate::core::rates::{RateSource, RateTable};
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, instrument};

pub struct SimulatedMarketSource {
    base: RateTable,
    jitter_percent: f64,
    latency: Duration,
}

impl SimulatedMarketSource {
    pub fn new(base: RateTable, jitter_percent: f64) -> Self {
        Self {
            base,
            jitter_percent: jitter_percent.max(0.0),
            latency: Duration::ZERO,
        }
    }

    /// Adds an artificial delay to each refresh, like a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> RateTable {
        self.base
            .iter()
            .map(|(code, rate)| (code.clone(), fluctuate(rate, self.jitter_percent, rng)))
            .collect()
    }
}

/// Moves `base` up or down by at most `jitter_percent` percent. Rates of one
/// or more are floored to whole units, the way market boards quote them.
pub fn fluctuate<R: Rng + ?Sized>(base: f64, jitter_percent: f64, rng: &mut R) -> f64 {
    if jitter_percent <= 0.0 {
        return base;
    }
    let delta = rng.random::<f64>() * base * jitter_percent / 100.0;
    let moved = if rng.random_bool(0.5) {
        base + delta
    } else {
        base - delta
    };
    if moved >= 1.0 { moved.floor() } else { moved }
}

#[async_trait]
impl RateSource for SimulatedMarketSource {
    #[instrument(name = "SimulatedRateFetch", skip(self))]
    async fn fetch_rates(&self) -> Result<RateTable> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let table = self.generate(&mut rand::rng());
        debug!(rates = ?table, "Generated market rates");
        Ok(table)
    }
}
