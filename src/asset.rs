use serde::{Deserialize, Serialize};

/// Market snapshot of one asset as returned by `/coins/markets`, with an
/// optional owned quantity layered on top once holdings are merged in.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AssetRecord {
    pub id: String,
    #[serde(rename = "symbol")]
    pub ticker: String,
    #[serde(rename = "name")]
    pub full_name: String,
    #[serde(rename = "image", default)]
    pub icon_url: String,
    #[serde(rename = "current_price", default, deserialize_with = "null_as_zero")]
    pub price_usd: f64,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(rename = "market_cap_rank", default)]
    pub rank: Option<f64>,
    #[serde(rename = "fully_diluted_valuation", default)]
    pub diluted_valuation: Option<f64>,
    #[serde(rename = "total_volume", default)]
    pub volume: Option<f64>,
    #[serde(rename = "high_24h", default)]
    pub day_high: Option<f64>,
    #[serde(rename = "low_24h", default)]
    pub day_low: Option<f64>,
    #[serde(rename = "price_change_24h", default)]
    pub day_change: Option<f64>,
    #[serde(rename = "price_change_percentage_24h", default)]
    pub day_change_percent: Option<f64>,
    #[serde(rename = "market_cap_change_24h", default)]
    pub cap_change: Option<f64>,
    #[serde(rename = "market_cap_change_percentage_24h", default)]
    pub cap_change_percent: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
    #[serde(rename = "ath", default)]
    pub all_time_high: Option<f64>,
    #[serde(rename = "ath_change_percentage", default)]
    pub ath_change_percent: Option<f64>,
    #[serde(rename = "ath_date", default)]
    pub ath_date: Option<String>,
    #[serde(rename = "atl", default)]
    pub all_time_low: Option<f64>,
    #[serde(rename = "atl_change_percentage", default)]
    pub atl_change_percent: Option<f64>,
    #[serde(rename = "atl_date", default)]
    pub atl_date: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(
        rename = "sparkline_in_7d",
        default,
        deserialize_with = "deserialize_sparkline",
        serialize_with = "serialize_sparkline"
    )]
    pub week_price_series: Option<Vec<f64>>,
    #[serde(rename = "price_change_percentage_24h_in_currency", default)]
    pub day_change_percent_in_currency: Option<f64>,
    #[serde(skip)]
    pub owned_quantity: Option<f64>,
}

impl AssetRecord {
    pub fn with_owned_quantity(&self, quantity: f64) -> Self {
        Self {
            owned_quantity: Some(quantity),
            ..self.clone()
        }
    }

    pub fn owned_value(&self) -> f64 {
        self.owned_quantity.unwrap_or(0.0) * self.price_usd
    }

    pub fn rank_as_int(&self) -> i64 {
        self.rank.unwrap_or(0.0).floor() as i64
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Sparkline {
    #[serde(default)]
    price: Option<Vec<f64>>,
}

fn deserialize_sparkline<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let sparkline: Option<Sparkline> = Option::deserialize(deserializer)?;
    Ok(sparkline.and_then(|s| s.price))
}

fn serialize_sparkline<S>(series: &Option<Vec<f64>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match series {
        Some(price) => Sparkline {
            price: Some(price.clone()),
        }
        .serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// Supplementary data from `/coins/{id}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AssetDetail {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage_urls: Option<Vec<String>>,
    #[serde(default)]
    pub subreddit_url: Option<String>,
    #[serde(default)]
    pub block_time_minutes: Option<i64>,
    #[serde(default)]
    pub hashing_algorithm: Option<String>,
}

impl AssetDetail {
    /// Description with HTML tags removed.
    pub fn plain_description(&self) -> Option<String> {
        self.description.as_deref().map(strip_tags)
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage_urls
            .as_ref()?
            .iter()
            .map(String::as_str)
            .find(|url| !url.is_empty())
    }
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

/// Aggregate market snapshot from `/global`, already formatted for display.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GlobalStats {
    pub total_market_cap_formatted: String,
    pub total_volume_formatted: String,
    pub btc_dominance_formatted: String,
    pub cap_change_percent_24h: Option<f64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_asset_from_json() {
        let json = json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 58908,
            "market_cap": 1100013258170_u64,
            "market_cap_rank": 1,
            "total_volume": 69075964521_u64,
            "high_24h": 59504,
            "low_24h": 57672,
            "price_change_24h": 808.94,
            "price_change_percentage_24h": 1.39234,
            "roi": null,
            "fully_diluted_valuation": null,
            "max_supply": null,
            "sparkline_in_7d": { "price": [57812.96915967891, 57504.33531773738] },
            "some_new_field": "ignored"
        });
        let asset: AssetRecord = serde_json::from_value(json).unwrap();
        assert_eq!(asset.id, "bitcoin");
        assert_eq!(asset.ticker, "btc");
        assert_eq!(asset.full_name, "Bitcoin");
        assert_eq!(asset.price_usd, 58908.0);
        assert_eq!(asset.rank, Some(1.0));
        assert_eq!(asset.day_change_percent, Some(1.39234));
        assert_eq!(asset.max_supply, None);
        assert_eq!(asset.cap_change, None);
        assert_eq!(asset.week_price_series.map(|s| s.len()), Some(2));
        assert_eq!(asset.owned_quantity, None);
    }

    #[test]
    fn test_owned_value_without_holding() {
        let asset = AssetRecord {
            id: "eth".into(),
            price_usd: 50.0,
            ..Default::default()
        };
        assert_eq!(asset.owned_value(), 0.0);
        assert_eq!(asset.with_owned_quantity(0.0).owned_value(), 0.0);
        assert_eq!(asset.with_owned_quantity(3.0).owned_value(), 150.0);
    }

    #[test]
    fn test_rank_as_int() {
        let mut asset = AssetRecord::default();
        assert_eq!(asset.rank_as_int(), 0);
        asset.rank = Some(7.9);
        assert_eq!(asset.rank_as_int(), 7);
    }

    #[test]
    fn test_with_owned_quantity_keeps_original() {
        let asset = AssetRecord {
            id: "bitcoin".into(),
            price_usd: 100.0,
            ..Default::default()
        };
        let held = asset.with_owned_quantity(2.0);
        assert_eq!(asset.owned_quantity, None);
        assert_eq!(held.owned_quantity, Some(2.0));
        assert_eq!(held.id, asset.id);
    }

    #[test]
    fn test_plain_description() {
        let detail = AssetDetail {
            description: Some("Bitcoin is <a href=\"x\">money</a>.".into()),
            homepage_urls: Some(vec!["".into(), "https://bitcoin.org".into()]),
            ..Default::default()
        };
        assert_eq!(detail.plain_description().unwrap(), "Bitcoin is money.");
        assert_eq!(detail.homepage(), Some("https://bitcoin.org"));
    }
}
