use reqwest::Url;
use serde::Deserialize;

use crate::asset::{AssetDetail, AssetRecord};
use crate::error::{Error, Result};
use crate::market::coingecko::CoinGecko;

const MARKETS_PARAMS: [(&str, &str); 6] = [
    ("vs_currency", "usd"),
    ("order", "market_cap_desc"),
    ("per_page", "250"),
    ("page", "1"),
    ("sparkline", "true"),
    ("price_change_percentage", "24h"),
];

const COIN_PARAMS: [(&str, &str); 6] = [
    ("localization", "false"),
    ("tickers", "false"),
    ("market_data", "false"),
    ("community_data", "false"),
    ("developer_data", "false"),
    ("sparkline", "false"),
];

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CoinDetail {
    pub id: String,
    #[serde(default)]
    pub block_time_in_minutes: Option<i64>,
    #[serde(default)]
    pub hashing_algorithm: Option<String>,
    #[serde(default)]
    pub description: Option<CoinDescription>,
    #[serde(default)]
    pub links: Option<CoinLinks>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CoinDescription {
    #[serde(default)]
    pub en: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CoinLinks {
    #[serde(default)]
    pub homepage: Option<Vec<String>>,
    #[serde(default)]
    pub subreddit_url: Option<String>,
}

impl From<CoinDetail> for AssetDetail {
    fn from(coin: CoinDetail) -> Self {
        let links = coin.links.unwrap_or_default();
        AssetDetail {
            id: coin.id,
            description: coin
                .description
                .and_then(|d| d.en)
                .filter(|text| !text.is_empty()),
            homepage_urls: links.homepage,
            subreddit_url: links.subreddit_url.filter(|url| !url.is_empty()),
            block_time_minutes: coin.block_time_in_minutes,
            hashing_algorithm: coin.hashing_algorithm,
        }
    }
}

impl CoinGecko {
    pub async fn get_markets(&self) -> Result<Vec<AssetRecord>> {
        let url = self.url("/coins/markets", &MARKETS_PARAMS)?;
        self.get_json(url).await
    }

    fn coin_url(&self, asset_id: &str) -> Result<Url> {
        let mut url = self.url("/coins", &COIN_PARAMS)?;
        url.path_segments_mut()
            .map_err(|_| Error::Url("endpoint cannot take path segments".to_string()))?
            .push(asset_id);
        Ok(url)
    }

    pub async fn get_coin(&self, asset_id: &str) -> Result<AssetDetail> {
        let url = self.coin_url(asset_id)?;
        let coin: CoinDetail = self.get_json(url).await?;
        Ok(coin.into())
    }
}
