use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::observable::{Observable, Subscription};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileRepository;
pub use memory::MemoryRepository;

/// Owned quantity of one asset. Only exists while `quantity > 0`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HoldingRecord {
    pub asset_id: String,
    pub quantity: f64,
}

impl HoldingRecord {
    pub fn new(asset_id: &str, quantity: f64) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            quantity,
        }
    }
}

/// Persistent storage of holdings, keyed by asset id.
#[async_trait]
pub trait HoldingsRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<HoldingRecord>>;

    /// Creates the record or replaces the quantity of the existing one.
    async fn upsert(&self, record: HoldingRecord) -> Result<()>;

    /// Returns whether a record was removed.
    async fn delete(&self, asset_id: &str) -> Result<bool>;
}

/// Holdings adapter: applies quantity updates and republishes the whole
/// collection after each one.
pub struct HoldingsStore {
    repository: Arc<dyn HoldingsRepository>,
    write_lock: Mutex<()>,
    records: Observable<Arc<Vec<HoldingRecord>>>,
}

impl HoldingsStore {
    pub fn new(repository: Arc<dyn HoldingsRepository>) -> Self {
        Self {
            repository,
            write_lock: Mutex::new(()),
            records: Observable::default(),
        }
    }

    /// Initial read of the repository.
    pub async fn load(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.reload().await
    }

    pub fn read_all(&self) -> Arc<Vec<HoldingRecord>> {
        self.records.current()
    }

    pub fn subscribe(&self) -> Subscription<Arc<Vec<HoldingRecord>>> {
        self.records.subscribe()
    }

    /// `quantity > 0` creates or updates the holding, anything else removes it.
    pub async fn upsert(&self, asset_id: &str, quantity: f64) -> Result<()> {
        if quantity.is_nan() || quantity.is_infinite() {
            let err = Error::InvalidQuantity {
                asset_id: asset_id.to_string(),
                quantity,
            };
            error!("Rejected holding update : {err}");
            return Err(err);
        }

        let _guard = self.write_lock.lock().await;

        let result = if quantity > 0.0 {
            self.repository
                .upsert(HoldingRecord::new(asset_id, quantity))
                .await
        } else {
            self.repository.delete(asset_id).await.map(|removed| {
                if !removed {
                    debug!("No holding to remove for {asset_id}");
                }
            })
        };

        if let Err(err) = result {
            error!("Failed updating holding {asset_id} : {err}");
            return Err(err);
        }

        self.reload().await
    }

    async fn reload(&self) -> Result<()> {
        match self.repository.list().await {
            Ok(records) => {
                debug!("Loaded {} holdings", records.len());
                self.records.publish(Arc::new(records));
                Ok(())
            }
            Err(err) => {
                error!("Failed reading holdings : {err}");
                Err(err)
            }
        }
    }
}
