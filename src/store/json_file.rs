use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::store::{HoldingRecord, HoldingsRepository};

pub const HOLDINGS_FILE_NAME: &str = "holdings.json";

/// Holdings stored as one JSON array on disk. Writes go to a sibling temp
/// file first and are renamed over the original.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(HOLDINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<HoldingRecord>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(vec![]),
            Ok(content) => Ok(serde_json::from_str(content.as_str())?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, records: &[HoldingRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content.as_bytes()).await?;
        fs::rename(&tmp_path, &self.path).await?;
        debug!("Wrote {} holdings to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl HoldingsRepository for JsonFileRepository {
    async fn list(&self) -> Result<Vec<HoldingRecord>> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn upsert(&self, record: HoldingRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        match records.iter_mut().find(|r| r.asset_id == record.asset_id) {
            Some(existing) => existing.quantity = record.quantity,
            None => records.push(record),
        }
        self.write(&records).await
    }

    async fn delete(&self, asset_id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        let before = records.len();
        records.retain(|r| r.asset_id != asset_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write(&records).await?;
        Ok(true)
    }
}
