use async_trait::async_trait;

use crate::asset::{AssetDetail, AssetRecord, GlobalStats};
use crate::error::Result;

pub mod coingecko;
#[cfg(test)]
pub mod fake;

/// Remote source of market data.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Full ranked asset collection, one page of up to 250 assets.
    async fn get_assets(&self) -> Result<Vec<AssetRecord>>;

    async fn get_global_stats(&self) -> Result<GlobalStats>;

    async fn get_asset_detail(&self, asset_id: &str) -> Result<AssetDetail>;
}

#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn get_image(&self, url: &str) -> Result<Vec<u8>>;
}
