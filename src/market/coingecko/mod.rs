use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::asset::{AssetDetail, AssetRecord, GlobalStats};
use crate::error::{Error, Result};
use crate::market::{ImageApi, MarketDataApi};

mod coins_api;
mod global_api;

pub const DEFAULT_ENDPOINT: &str = "https://api.coingecko.com/api/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CoinGecko {
    client: Client,
    endpoint: String,
}

impl CoinGecko {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let url = format!("{}{}", self.endpoint, path);
        let url = if params.is_empty() {
            Url::parse(url.as_str())
        } else {
            Url::parse_with_params(url.as_str(), params)
        };
        url.map_err(|e| Error::Url(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        info!("{}", url);
        let r = self.client.get(url).send().await?.error_for_status()?;
        let body = r.text().await?;
        Ok(serde_json::from_str(body.as_str())?)
    }
}

#[async_trait]
impl MarketDataApi for CoinGecko {
    async fn get_assets(&self) -> Result<Vec<AssetRecord>> {
        self.get_markets().await
    }

    async fn get_global_stats(&self) -> Result<GlobalStats> {
        self.get_global().await
    }

    async fn get_asset_detail(&self, asset_id: &str) -> Result<AssetDetail> {
        self.get_coin(asset_id).await
    }
}

#[async_trait]
impl ImageApi for CoinGecko {
    async fn get_image(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url).map_err(|e| Error::Url(e.to_string()))?;
        info!("{}", url);
        let r = self.client.get(url).send().await?.error_for_status()?;
        Ok(r.bytes().await?.to_vec())
    }
}
