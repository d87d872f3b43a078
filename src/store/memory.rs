use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::store::{HoldingRecord, HoldingsRepository};

/// Holdings kept in memory only, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Mutex<Vec<HoldingRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HoldingRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Makes every following write fail, for exercising error paths.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence(std::io::Error::other(
                "memory repository is read only",
            )));
        }
        Ok(())
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<HoldingRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HoldingsRepository for MemoryRepository {
    async fn list(&self) -> Result<Vec<HoldingRecord>> {
        Ok(self.records().clone())
    }

    async fn upsert(&self, record: HoldingRecord) -> Result<()> {
        self.check_writable()?;
        let mut records = self.records();
        match records.iter_mut().find(|r| r.asset_id == record.asset_id) {
            Some(existing) => existing.quantity = record.quantity,
            None => records.push(record),
        }
        Ok(())
    }

    async fn delete(&self, asset_id: &str) -> Result<bool> {
        self.check_writable()?;
        let mut records = self.records();
        let before = records.len();
        records.retain(|r| r.asset_id != asset_id);
        Ok(records.len() != before)
    }
}
