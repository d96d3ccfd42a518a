//! Debounced, de-duplicated recording of finished conversions.
//!
//! The recorder is a small explicit state machine. Callers feed it an
//! [`Observation`] after every input change and poll it with the current
//! time; it never schedules anything itself. [`HistoryRecorder::deadline`]
//! tells an async driver how long it may sleep.
use crate::core::currency::CurrencyCode;
use crate::core::engine::ConversionResult;
use crate::core::history::HistoryRecord;
use chrono::{Local, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// How long the inputs must stay unchanged before a conversion is saved.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(2000);

/// The current calculator inputs as seen by the recorder.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub computation: Option<ConversionResult>,
    pub amount_text: String,
    pub rate_text: String,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

/// Identifies a calculation by exactly what the user typed and selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    from: CurrencyCode,
    to: CurrencyCode,
    amount_text: String,
    rate_text: String,
}

#[derive(Debug, Clone)]
struct PendingSave {
    signature: Signature,
    computation: ConversionResult,
    deadline: Instant,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Pending(PendingSave),
}

#[derive(Debug)]
pub struct HistoryRecorder {
    state: State,
    last_emitted: Option<Signature>,
    last_id: u64,
    delay: Duration,
}

impl Default for HistoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self::with_delay(DEBOUNCE_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            state: State::Idle,
            last_emitted: None,
            last_id: 0,
            delay,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending(_))
    }

    /// When the pending save fires, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Idle => None,
            State::Pending(pending) => Some(pending.deadline),
        }
    }

    /// Handles an input change. Any pending save is dropped first; a new one
    /// starts only for a complete calculation that differs from the last
    /// saved one.
    pub fn observe(&mut self, observation: Observation, now: Instant) {
        self.cancel();

        let Some(computation) = observation.computation else {
            return;
        };
        if observation.amount_text.is_empty() || observation.rate_text.is_empty() {
            return;
        }

        let signature = Signature {
            from: observation.from,
            to: observation.to,
            amount_text: observation.amount_text,
            rate_text: observation.rate_text,
        };
        if self.last_emitted.as_ref() == Some(&signature) {
            debug!(?signature, "Calculation already recorded");
            return;
        }

        let deadline = now + self.delay;
        debug!(?signature, "History save pending");
        self.state = State::Pending(PendingSave {
            signature,
            computation,
            deadline,
        });
    }

    /// Emits the pending record once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<HistoryRecord> {
        match &self.state {
            State::Pending(pending) if now >= pending.deadline => {}
            _ => return None,
        }
        let State::Pending(pending) = std::mem::replace(&mut self.state, State::Idle) else {
            return None;
        };

        let stamp = Local::now();
        let record = HistoryRecord {
            id: self.next_id(),
            date: stamp.date_naive(),
            time: stamp.time(),
            from: pending.signature.from.clone(),
            to: pending.signature.to.clone(),
            rate: pending.computation.rate,
            amount: pending.computation.amount,
            result: pending.computation.result,
        };
        self.last_emitted = Some(pending.signature);
        debug!(id = record.id, "History save fired");
        Some(record)
    }

    /// Drops a pending save without emitting it.
    pub fn cancel(&mut self) {
        if let State::Pending(pending) = std::mem::replace(&mut self.state, State::Idle) {
            debug!(signature = ?pending.signature, "Pending history save cancelled");
        }
    }

    /// Session teardown. Nothing pending is ever flushed.
    pub fn shutdown(&mut self) {
        self.cancel();
    }

    fn next_id(&mut self) -> u64 {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.last_id = millis.max(self.last_id + 1);
        self.last_id
    }
}
