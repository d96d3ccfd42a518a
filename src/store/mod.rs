pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::history::HistoryStore;
use anyhow::Result;
use disk::DiskHistoryStore;
use memory::MemoryHistoryStore;
use tracing::warn;

/// Opens the persistent history under the configured data directory. When
/// that fails, history is kept in memory for this session only.
pub fn open_history_store(config: &AppConfig) -> Result<Box<dyn HistoryStore>> {
    let path = config.data_path()?.join("history");
    match DiskHistoryStore::open(&path) {
        Ok(store) => Ok(Box::new(store)),
        Err(e) => {
            warn!(error = %e, "History will not be saved across sessions");
            Ok(Box::new(MemoryHistoryStore::new()))
        }
    }
}
