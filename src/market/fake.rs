use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::asset::{AssetDetail, AssetRecord, GlobalStats};
use crate::error::{Error, Result};
use crate::market::{ImageApi, MarketDataApi};

/// Scripted responses: each call pops the next `(delay, response)`; `None`
/// or an empty script fails the call with a 500.
#[derive(Default)]
pub struct FakeMarket {
    assets: Mutex<VecDeque<(Duration, Option<Vec<AssetRecord>>)>>,
    global: Mutex<VecDeque<(Duration, Option<GlobalStats>)>>,
    detail: Mutex<Option<AssetDetail>>,
    image: Mutex<Option<Vec<u8>>>,
    pub asset_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

fn failure() -> Error {
    Error::Status {
        status: 500,
        url: "fake://market".to_string(),
    }
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_assets(&self, delay: Duration, assets: Option<Vec<AssetRecord>>) -> &Self {
        self.assets.lock().unwrap().push_back((delay, assets));
        self
    }

    pub fn push_global(&self, delay: Duration, global: Option<GlobalStats>) -> &Self {
        self.global.lock().unwrap().push_back((delay, global));
        self
    }

    pub fn set_detail(&self, detail: AssetDetail) -> &Self {
        *self.detail.lock().unwrap() = Some(detail);
        self
    }

    pub fn set_image(&self, bytes: Vec<u8>) -> &Self {
        *self.image.lock().unwrap() = Some(bytes);
        self
    }
}

#[async_trait]
impl MarketDataApi for FakeMarket {
    async fn get_assets(&self) -> Result<Vec<AssetRecord>> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.assets.lock().unwrap().pop_front();
        let (delay, response) = next.unwrap_or((Duration::ZERO, None));
        tokio::time::sleep(delay).await;
        response.ok_or_else(failure)
    }

    async fn get_global_stats(&self) -> Result<GlobalStats> {
        let next = self.global.lock().unwrap().pop_front();
        let (delay, response) = next.unwrap_or((Duration::ZERO, None));
        tokio::time::sleep(delay).await;
        response.ok_or_else(failure)
    }

    async fn get_asset_detail(&self, asset_id: &str) -> Result<AssetDetail> {
        self.detail
            .lock()
            .unwrap()
            .clone()
            .filter(|detail| detail.id == asset_id)
            .ok_or_else(failure)
    }
}

#[async_trait]
impl ImageApi for FakeMarket {
    async fn get_image(&self, _url: &str) -> Result<Vec<u8>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.image.lock().unwrap().clone().ok_or_else(failure)
    }
}
