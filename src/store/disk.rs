use crate::core::history::{HISTORY_CAPACITY, HistoryRecord, HistoryStore};
use anyhow::{Context, Result};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const PARTITION: &str = "history";

/// History kept in a fjall partition.
///
/// Keys are a big-endian sequence owned by the store, so the partition's
/// natural order is append order whatever the record ids or the wall clock
/// say.
pub struct DiskHistoryStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
    next_seq: AtomicU64,
}

fn decode_seq(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .context("History key is not an 8 byte sequence number")?;
    Ok(u64::from_be_bytes(bytes))
}

impl DiskHistoryStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open history at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .context("Failed to open history partition")?;
        let next_seq = match partition.last_key_value()? {
            Some((key, _)) => decode_seq(&key)? + 1,
            None => 0,
        };
        debug!(next_seq, "Opened history store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
            next_seq: AtomicU64::new(next_seq),
        })
    }

    fn count(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.partition.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn evict_overflow(&self) -> Result<()> {
        let mut count = self.count()?;
        while count > HISTORY_CAPACITY {
            let Some((oldest, _)) = self.partition.first_key_value()? else {
                break;
            };
            self.partition.remove(oldest)?;
            count -= 1;
            debug!("History EVICT");
        }
        Ok(())
    }
}

impl HistoryStore for DiskHistoryStore {
    fn append(&self, record: HistoryRecord) -> Result<()> {
        let value = serde_json::to_vec(&record)?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.partition
            .insert(seq.to_be_bytes().to_vec(), value)
            .context("Failed to write history record")?;
        self.evict_overflow()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(id = record.id, seq, "History APPEND");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let keys = self
            .partition
            .iter()
            .map(|item| item.map(|(key, _)| key))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for key in keys {
            self.partition.remove(key)?;
        }
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("History CLEAR");
        Ok(())
    }

    fn list(&self) -> Result<Vec<HistoryRecord>> {
        let mut records = Vec::new();
        for item in self.partition.iter().rev().take(HISTORY_CAPACITY) {
            let (_, value) = item?;
            match serde_json::from_slice::<HistoryRecord>(&value) {
                Ok(record) => records.push(record),
                Err(e) => debug!("Skipping unreadable history record: {}", e),
            }
        }
        Ok(records)
    }
}
