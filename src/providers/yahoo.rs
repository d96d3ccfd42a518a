use crate::core::currency::{CurrencyCode, CurrencySet};
use crate::core::rates::{RateSource, RateTable};
use crate::providers::util::{RetryPolicy, with_retry};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const QUOTE_RETRY: RetryPolicy = RetryPolicy::new(2, Duration::from_millis(500));

/// Fetches "1 foreign = N local" quotes from a Yahoo Finance compatible
/// chart endpoint, one `{FOREIGN}{LOCAL}=X` symbol per foreign currency.
pub struct YahooRateSource {
    base_url: String,
    currencies: CurrencySet,
    client: reqwest::Client,
}

impl YahooRateSource {
    pub fn new(base_url: &str, currencies: CurrencySet) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("kyatfast/1.0")
            .build()
            .unwrap_or_default();
        YahooRateSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            currencies,
            client,
        }
    }

    fn symbol(&self, foreign: &CurrencyCode) -> String {
        format!("{}{}=X", foreign, self.currencies.local_code())
    }

    #[instrument(name = "YahooRateFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &str) -> Result<f64> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting currency rate from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;

        let data: YahooCurrencyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;

        Ok(item.meta.regular_market_price)
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[async_trait]
impl RateSource for YahooRateSource {
    async fn fetch_rates(&self) -> Result<RateTable> {
        let quote_futures = self.currencies.foreign_codes().iter().map(|code| async move {
            let symbol = self.symbol(code);
            let quote = with_retry(&symbol, QUOTE_RETRY, || self.fetch_quote(&symbol)).await;
            (code.clone(), quote)
        });

        let mut table = RateTable::new();
        let mut last_error = None;
        for (code, quote) in join_all(quote_futures).await {
            match quote {
                Ok(rate) => table.insert(code, rate),
                Err(e) => {
                    warn!(currency = %code, error = %e, "No quote, rate left unknown");
                    last_error = Some(e);
                }
            }
        }

        if table.is_empty() {
            match last_error {
                Some(e) => return Err(e.context("Every currency quote failed")),
                None => bail!("No currency quotes available"),
            }
        }
        Ok(table)
    }
}
