//! Core conversion logic and its collaborator contracts

pub mod calculator;
pub mod config;
pub mod currency;
pub mod engine;
pub mod history;
pub mod log;
pub mod rates;
pub mod recorder;

// Re-export main types for cleaner imports
pub use calculator::{Calculator, Evaluation};
pub use currency::{Currency, CurrencyCode, CurrencySet};
pub use engine::{ConversionResult, Direction};
pub use history::{HISTORY_CAPACITY, HistoryRecord, HistoryStore};
pub use rates::{RateBoard, RateSnapshot, RateSource, RateTable};
pub use recorder::{HistoryRecorder, Observation};
