//! Pure conversion functions.
//!
//! Every rate is "1 foreign unit = rate local units". Converting from a
//! foreign currency multiplies by that rate and converting from the local
//! currency divides by the same number; no inverse rate is ever stored.

use crate::core::currency::{Currency, CurrencyCode};
use crate::core::rates::RateTable;

/// How the rate was applied to the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Foreign to local, `amount × rate`
    Multiply,
    /// Local to foreign, `amount ÷ rate`
    Divide,
}

impl Direction {
    pub fn for_source(source: &Currency) -> Self {
        if source.is_local() {
            Direction::Divide
        } else {
            Direction::Multiply
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Direction::Multiply => '×',
            Direction::Divide => '÷',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionResult {
    pub amount: f64,
    pub rate: f64,
    pub result: f64,
    pub direction: Direction,
}

/// Picks the currency whose rate applies to a pair. `None` when both sides
/// are local.
pub fn resolve_foreign_currency(source: &Currency, target: &Currency) -> Option<CurrencyCode> {
    source
        .foreign_code()
        .or_else(|| target.foreign_code())
        .cloned()
}

/// The rate a conversion should use: the table's entry in automatic mode,
/// otherwise whatever the user typed.
pub fn resolve_effective_rate(
    is_automatic: bool,
    table: &RateTable,
    foreign: Option<&CurrencyCode>,
    manual_rate_text: &str,
) -> Option<f64> {
    if is_automatic {
        foreign.and_then(|code| table.get(code))
    } else {
        parse_number(manual_rate_text)
    }
}

/// Parses user-entered numbers such as "1,500" or " 4500.25 ".
///
/// Only strictly positive finite values are accepted.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

/// Converts `amount_text` at `rate_text`. `None` means "not computable yet",
/// e.g. while the user is still typing.
pub fn compute(amount_text: &str, rate_text: &str, source: &Currency) -> Option<ConversionResult> {
    let amount = parse_number(amount_text)?;
    let rate = parse_number(rate_text)?;
    let direction = Direction::for_source(source);
    let result = match direction {
        Direction::Multiply => amount * rate,
        Direction::Divide => amount / rate,
    };
    if !result.is_finite() {
        return None;
    }
    Some(ConversionResult {
        amount,
        rate,
        result,
        direction,
    })
}
