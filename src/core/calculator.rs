//! The state of one calculator session and the rules for changing it.
use crate::core::currency::{Currency, CurrencyCode, CurrencySet};
use crate::core::engine::{self, ConversionResult};
use crate::core::rates::RateTable;
use crate::core::recorder::Observation;
use tracing::debug;

/// What the calculator can show for its current input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Computed(ConversionResult),
    /// Automatic mode is on but the table has no rate for the pair.
    RateUnavailable,
    NotComputable,
}

impl Evaluation {
    pub fn result(&self) -> Option<&ConversionResult> {
        match self {
            Evaluation::Computed(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Target,
}

/// Holds the user's current conversion input.
///
/// A stable pair always has the local currency on exactly one side, so source
/// and target never collide and the foreign currency is never ambiguous.
#[derive(Debug, Clone)]
pub struct Calculator {
    currencies: CurrencySet,
    table: RateTable,
    source: Currency,
    target: Currency,
    foreign: Option<CurrencyCode>,
    amount_text: String,
    rate_text: String,
    is_automatic: bool,
}

impl Calculator {
    pub fn new(currencies: CurrencySet, table: RateTable) -> Self {
        let source = currencies.default_foreign();
        let target = Currency::Local;
        let foreign = engine::resolve_foreign_currency(&source, &target);
        let mut calculator = Self {
            currencies,
            table,
            source,
            target,
            foreign,
            amount_text: String::new(),
            rate_text: String::new(),
            is_automatic: true,
        };
        calculator.sync_rate_text();
        calculator
    }

    pub fn currencies(&self) -> &CurrencySet {
        &self.currencies
    }

    pub fn source(&self) -> &Currency {
        &self.source
    }

    pub fn target(&self) -> &Currency {
        &self.target
    }

    pub fn foreign(&self) -> Option<&CurrencyCode> {
        self.foreign.as_ref()
    }

    pub fn amount_text(&self) -> &str {
        &self.amount_text
    }

    pub fn rate_text(&self) -> &str {
        &self.rate_text
    }

    pub fn is_automatic(&self) -> bool {
        self.is_automatic
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    pub fn select_source(&mut self, currency: Currency) {
        self.select(Side::Source, currency);
    }

    pub fn select_target(&mut self, currency: Currency) {
        self.select(Side::Target, currency);
    }

    fn select(&mut self, side: Side, currency: Currency) {
        if !self.currencies.contains(&currency) {
            debug!(?currency, "Ignoring selection outside the currency set");
            return;
        }
        let other = match side {
            Side::Source => &self.target,
            Side::Target => &self.source,
        };
        let forced = if currency == *other {
            // Collision: push the other side to the opposite default
            Some(if currency.is_local() {
                self.currencies.default_foreign()
            } else {
                Currency::Local
            })
        } else if !currency.is_local() && !other.is_local() {
            // Foreign to foreign would need a cross rate
            Some(Currency::Local)
        } else {
            None
        };

        match side {
            Side::Source => {
                self.source = currency;
                if let Some(forced) = forced {
                    self.target = forced;
                }
            }
            Side::Target => {
                self.target = currency;
                if let Some(forced) = forced {
                    self.source = forced;
                }
            }
        }
        debug!(source = ?self.source, target = ?self.target, "Currency pair changed");
        self.update_foreign();
    }

    /// Exchanges source and target. The foreign currency, and so the rate,
    /// stays the same; only the direction flips.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.source, &mut self.target);
        self.update_foreign();
    }

    pub fn set_amount_text(&mut self, text: impl Into<String>) {
        self.amount_text = text.into();
    }

    /// Typing a rate is an implicit switch to manual mode.
    pub fn set_rate_text(&mut self, text: impl Into<String>) {
        self.rate_text = text.into();
        self.is_automatic = false;
    }

    pub fn set_automatic(&mut self, automatic: bool) {
        self.is_automatic = automatic;
        self.sync_rate_text();
    }

    pub fn toggle_rate_mode(&mut self) {
        self.set_automatic(!self.is_automatic);
    }

    /// Installs a freshly refreshed table.
    pub fn apply_rates(&mut self, table: RateTable) {
        self.table = table;
        self.sync_rate_text();
    }

    pub fn effective_rate(&self) -> Option<f64> {
        engine::resolve_effective_rate(
            self.is_automatic,
            &self.table,
            self.foreign.as_ref(),
            &self.rate_text,
        )
    }

    pub fn evaluate(&self) -> Evaluation {
        if self.is_automatic && self.effective_rate().is_none() {
            return Evaluation::RateUnavailable;
        }
        match engine::compute(&self.amount_text, &self.rate_text, &self.source) {
            Some(result) => Evaluation::Computed(result),
            None => Evaluation::NotComputable,
        }
    }

    /// The inputs the history recorder watches.
    pub fn observation(&self) -> Observation {
        Observation {
            computation: self.evaluate().result().copied(),
            amount_text: self.amount_text.clone(),
            rate_text: self.rate_text.clone(),
            from: self.currencies.code_of(&self.source).clone(),
            to: self.currencies.code_of(&self.target).clone(),
        }
    }

    fn update_foreign(&mut self) {
        // Both sides local keeps whatever was resolved before
        if let Some(code) = engine::resolve_foreign_currency(&self.source, &self.target) {
            if self.foreign.as_ref() != Some(&code) {
                self.foreign = Some(code);
                self.sync_rate_text();
            }
        }
    }

    /// One way sync from the table into the rate field, automatic mode only.
    fn sync_rate_text(&mut self) {
        if !self.is_automatic {
            return;
        }
        if let Some(rate) = self.foreign.as_ref().and_then(|code| self.table.get(code)) {
            self.rate_text = rate.to_string();
        }
    }
}
