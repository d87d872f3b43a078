use std::collections::HashMap;

use serde::Deserialize;

use crate::asset::GlobalStats;
use crate::error::Result;
use crate::market::coingecko::CoinGecko;
use crate::utils::{currency_abbreviated, percent};

#[derive(Deserialize, Debug, Clone)]
pub struct GlobalResponse {
    pub data: GlobalData,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct GlobalData {
    #[serde(default)]
    pub total_market_cap: HashMap<String, f64>,
    #[serde(default)]
    pub total_volume: HashMap<String, f64>,
    #[serde(default)]
    pub market_cap_percentage: HashMap<String, f64>,
    #[serde(default)]
    pub market_cap_change_percentage_24h_usd: Option<f64>,
}

impl From<GlobalData> for GlobalStats {
    fn from(data: GlobalData) -> Self {
        GlobalStats {
            total_market_cap_formatted: currency_abbreviated(
                data.total_market_cap.get("usd").copied(),
            ),
            total_volume_formatted: currency_abbreviated(data.total_volume.get("usd").copied()),
            btc_dominance_formatted: data
                .market_cap_percentage
                .get("btc")
                .copied()
                .map(percent)
                .unwrap_or_default(),
            cap_change_percent_24h: data.market_cap_change_percentage_24h_usd,
        }
    }
}

impl CoinGecko {
    pub async fn get_global(&self) -> Result<GlobalStats> {
        let url = self.url("/global", &[])?;
        let response: GlobalResponse = self.get_json(url).await?;
        Ok(response.data.into())
    }
}
