use crate::core::history::{HISTORY_CAPACITY, HistoryRecord, HistoryStore};
use anyhow::Result;
use std::sync::Mutex;
use tracing::debug;

/// In-memory history, newest first. Nothing survives the process.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<HistoryRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, record: HistoryRecord) -> Result<()> {
        let mut records = self.records();
        debug!(id = record.id, "History APPEND");
        records.insert(0, record);
        records.truncate(HISTORY_CAPACITY);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.records().clear();
        debug!("History CLEAR");
        Ok(())
    }

    fn list(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.records().clone())
    }
}
