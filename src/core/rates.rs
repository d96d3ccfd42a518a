//! Market rate tables and their atomic refresh

use crate::core::currency::{Currency, CurrencyCode};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Rates quoted as "1 unit of foreign currency = N units of local currency".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<CurrencyCode, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate. Non-positive and non-finite values are dropped so that the
    /// currency reads as "rate unknown".
    pub fn insert(&mut self, code: CurrencyCode, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.rates.insert(code, rate);
        } else {
            debug!("Ignoring invalid rate {} for {}", rate, code);
            self.rates.remove(&code);
        }
    }

    pub fn with_rate(mut self, code: CurrencyCode, rate: f64) -> Self {
        self.insert(code, rate);
        self
    }

    pub fn get(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Rate of `currency` against local. Local is always exactly 1.
    pub fn rate(&self, currency: &Currency) -> Option<f64> {
        match currency {
            Currency::Local => Some(1.0),
            Currency::Foreign(code) => self.get(code),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.rates.iter().map(|(code, rate)| (code, *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(CurrencyCode, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (CurrencyCode, f64)>>(iter: I) -> Self {
        let mut table = RateTable::new();
        for (code, rate) in iter {
            table.insert(code, rate);
        }
        table
    }
}

/// A rate table together with the time it became current.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    pub table: RateTable,
    pub as_of: DateTime<Utc>,
}

/// Anything that can produce a complete, fresh rate table.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable>;
}

/// Holds the current rate snapshot and swaps it wholesale on refresh.
///
/// Readers always get a complete table, either the old one or the new one.
pub struct RateBoard {
    current: RwLock<Arc<RateSnapshot>>,
}

impl RateBoard {
    pub fn new(initial: RateTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(RateSnapshot {
                table: initial,
                as_of: Utc::now(),
            })),
        }
    }

    pub fn snapshot(&self) -> Arc<RateSnapshot> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Installs `table` as the current snapshot. `as_of` never moves backwards,
    /// even if the wall clock does.
    pub fn replace(&self, table: RateTable) -> Arc<RateSnapshot> {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Utc::now();
        let as_of = if now > guard.as_of {
            now
        } else {
            guard.as_of + Duration::milliseconds(1)
        };
        let snapshot = Arc::new(RateSnapshot { table, as_of });
        *guard = Arc::clone(&snapshot);
        snapshot
    }

    /// Fetches a new table from `source`. On failure the previous snapshot is
    /// kept and returned; the failure is only logged.
    pub async fn refresh(&self, source: &dyn RateSource) -> Arc<RateSnapshot> {
        match source.fetch_rates().await {
            Ok(table) if !table.is_empty() => {
                let snapshot = self.replace(table);
                info!(
                    rates = snapshot.table.len(),
                    as_of = %snapshot.as_of,
                    "Rates refreshed"
                );
                snapshot
            }
            Ok(_) => {
                warn!("Rate source returned no rates, keeping previous snapshot");
                self.snapshot()
            }
            Err(e) => {
                warn!(error = %e, "Rate refresh failed, keeping previous snapshot");
                self.snapshot()
            }
        }
    }
}
