//! History records and the storage contract for them
use crate::core::currency::CurrencyCode;
use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Maximum number of records any history store keeps.
pub const HISTORY_CAPACITY: usize = 50;

/// A finished conversion, saved once the user stopped editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unique and increasing in the order records were created.
    pub id: u64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: f64,
    pub amount: f64,
    pub result: f64,
}

/// Where history records end up.
///
/// Implementations own persistence, keep at most [`HISTORY_CAPACITY`]
/// records and always list them newest first.
pub trait HistoryStore: Send + Sync {
    fn append(&self, record: HistoryRecord) -> Result<()>;
    fn clear(&self) -> Result<()>;
    fn list(&self) -> Result<Vec<HistoryRecord>>;
}

#[cfg(test)]
pub(crate) fn sample_record(id: u64) -> HistoryRecord {
    HistoryRecord {
        id,
        date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        from: "THB".parse().unwrap(),
        to: "MMK".parse().unwrap(),
        rate: 132.0,
        amount: id as f64,
        result: id as f64 * 132.0,
    }
}
