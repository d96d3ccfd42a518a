pub mod simulated;
pub mod util;
pub mod yahoo;

use crate::core::config::{AppConfig, RateSourceKind};
use crate::core::rates::RateSource;
use anyhow::{Context, Result};
use simulated::SimulatedMarketSource;
use std::time::Duration;
use yahoo::YahooRateSource;

/// Builds the rate source selected in the configuration.
pub fn from_config(config: &AppConfig) -> Result<Box<dyn RateSource>> {
    let currencies = config.currency_set()?;
    let source: Box<dyn RateSource> = match config.rates.source {
        RateSourceKind::Simulated => Box::new(
            SimulatedMarketSource::new(config.base_rates()?, config.rates.jitter_percent)
                .with_latency(Duration::from_millis(config.rates.latency_ms)),
        ),
        RateSourceKind::Yahoo => {
            let base_url = config
                .providers
                .yahoo
                .as_ref()
                .map(|p| p.base_url.as_str())
                .context("rates.source is yahoo but providers.yahoo is not configured")?;
            Box::new(YahooRateSource::new(base_url, currencies))
        }
    };
    Ok(source)
}
