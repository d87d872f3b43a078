use std::fmt::Display;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::{AssetDetail, AssetRecord, GlobalStats};
use crate::utils::{currency_2, currency_2_to_6, currency_abbreviated, NOT_AVAILABLE};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InfoStat {
    pub id: String,
    pub label: String,
    pub value: String,
    /// Fractional change, `0.0139` is 1.39%.
    pub percent_delta: Option<f64>,
}

/// API percentages (`1.39` for 1.39%) as fractions.
fn fraction(percent: Option<f64>) -> Option<f64> {
    percent.map(|percent| percent / 100.0)
}

impl InfoStat {
    pub fn new(label: &str, value: String, percent_delta: Option<f64>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            value,
            percent_delta,
        }
    }
}

impl Display for InfoStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value.yellow())?;
        if let Some(delta) = self.percent_delta {
            let delta = format!("{:+.2}%", delta * 100.0);
            if delta.starts_with('-') {
                write!(f, " ({})", delta.red())?;
            } else {
                write!(f, " ({})", delta.green())?;
            }
        }
        Ok(())
    }
}

pub fn build_overview_stats(asset: &AssetRecord) -> Vec<InfoStat> {
    vec![
        InfoStat::new(
            "Current Price",
            currency_2_to_6(asset.price_usd),
            fraction(asset.day_change_percent),
        ),
        InfoStat::new(
            "Market Capitalization",
            currency_abbreviated(asset.market_cap),
            fraction(asset.cap_change_percent),
        ),
        InfoStat::new("Rank", asset.rank_as_int().to_string(), None),
        InfoStat::new("Volume", currency_abbreviated(asset.volume), None),
    ]
}

pub fn build_extra_stats(asset: &AssetRecord, detail: Option<&AssetDetail>) -> Vec<InfoStat> {
    let currency_or_na =
        |value: Option<f64>| value.map(currency_2_to_6).unwrap_or(NOT_AVAILABLE.to_string());

    let block_time = match detail.and_then(|d| d.block_time_minutes) {
        Some(minutes) if minutes != 0 => minutes.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    };
    let hashing = detail
        .and_then(|d| d.hashing_algorithm.clone())
        .unwrap_or(NOT_AVAILABLE.to_string());

    vec![
        InfoStat::new("24h High", currency_or_na(asset.day_high), None),
        InfoStat::new("24h Low", currency_or_na(asset.day_low), None),
        InfoStat::new(
            "24h Price Change",
            currency_or_na(asset.day_change),
            fraction(asset.day_change_percent),
        ),
        InfoStat::new(
            "24h Market Cap Change",
            currency_abbreviated(asset.cap_change),
            fraction(asset.cap_change_percent),
        ),
        InfoStat::new("Block Time", block_time, None),
        InfoStat::new("Hashing Algorithm", hashing, None),
    ]
}

/// Market wide stats followed by the portfolio value of `holdings`.
/// Empty until global stats have been fetched at least once.
pub fn build_global_stats(global: Option<&GlobalStats>, holdings: &[AssetRecord]) -> Vec<InfoStat> {
    let Some(global) = global else {
        return vec![];
    };

    let (total, delta) = portfolio_value(holdings);

    vec![
        InfoStat::new(
            "Market Cap",
            global.total_market_cap_formatted.clone(),
            fraction(global.cap_change_percent_24h),
        ),
        InfoStat::new("24h Volume", global.total_volume_formatted.clone(), None),
        InfoStat::new("BTC Dominance", global.btc_dominance_formatted.clone(), None),
        InfoStat::new("Portfolio Value", currency_2(total), delta),
    ]
}

/// Current total owned value and its fractional change over 24h.
///
/// The value a day ago is estimated per holding as
/// `owned_value / (1 + day_change_percent / 100)`. The change is absent when
/// that estimate sums to zero or is not finite.
pub fn portfolio_value(holdings: &[AssetRecord]) -> (f64, Option<f64>) {
    let total: f64 = holdings.iter().map(AssetRecord::owned_value).sum();

    let prior_total: f64 = holdings
        .iter()
        .map(|asset| {
            let current = asset.owned_value();
            let change = asset.day_change_percent.unwrap_or(0.0) / 100.0;
            let prior = current / (1.0 + change);
            if prior.is_finite() {
                prior
            } else {
                current
            }
        })
        .sum();

    if prior_total == 0.0 {
        return (total, None);
    }
    let delta = (total - prior_total) / prior_total;
    (total, delta.is_finite().then_some(delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitcoin() -> AssetRecord {
        AssetRecord {
            id: "bitcoin".into(),
            ticker: "btc".into(),
            full_name: "Bitcoin".into(),
            price_usd: 58908.0,
            market_cap: Some(1_100_013_258_170.0),
            rank: Some(1.0),
            volume: Some(69_075_964_521.0),
            day_high: Some(59504.0),
            day_low: None,
            day_change: Some(808.94),
            day_change_percent: Some(1.39234),
            cap_change: Some(13_240_944_103.0),
            cap_change_percent: Some(1.21837),
            ..Default::default()
        }
    }

    fn global() -> GlobalStats {
        GlobalStats {
            total_market_cap_formatted: "$2.10T".into(),
            total_volume_formatted: "$95.00B".into(),
            btc_dominance_formatted: "52.10%".into(),
            cap_change_percent_24h: Some(-0.5),
        }
    }

    fn values(stats: &[InfoStat]) -> Vec<(&str, &str)> {
        stats
            .iter()
            .map(|s| (s.label.as_str(), s.value.as_str()))
            .collect()
    }

    #[test]
    fn test_overview_stats() {
        let stats = build_overview_stats(&bitcoin());
        assert_eq!(
            values(&stats),
            vec![
                ("Current Price", "$58,908.00"),
                ("Market Capitalization", "$1.10T"),
                ("Rank", "1"),
                ("Volume", "$69.08B"),
            ]
        );
        assert_eq!(stats[0].percent_delta, Some(1.39234 / 100.0));
        assert_eq!(stats[1].percent_delta, Some(1.21837 / 100.0));
        assert_eq!(stats[2].percent_delta, None);
        assert_eq!(stats[3].percent_delta, None);
    }

    #[test]
    fn test_overview_stats_missing_fields_degrade() {
        let asset = AssetRecord {
            id: "dust".into(),
            price_usd: 0.000123,
            ..Default::default()
        };
        let stats = build_overview_stats(&asset);
        assert_eq!(
            values(&stats),
            vec![
                ("Current Price", "$0.000123"),
                ("Market Capitalization", "$"),
                ("Rank", "0"),
                ("Volume", "$"),
            ]
        );
    }

    #[test]
    fn test_extra_stats_without_detail() {
        let stats = build_extra_stats(&bitcoin(), None);
        assert_eq!(
            values(&stats),
            vec![
                ("24h High", "$59,504.00"),
                ("24h Low", "n/a"),
                ("24h Price Change", "$808.94"),
                ("24h Market Cap Change", "$13.24B"),
                ("Block Time", "n/a"),
                ("Hashing Algorithm", "n/a"),
            ]
        );
        assert_eq!(stats[2].percent_delta, Some(1.39234 / 100.0));
        assert_eq!(stats[3].percent_delta, Some(1.21837 / 100.0));
    }

    #[test]
    fn test_extra_stats_with_detail() {
        let detail = AssetDetail {
            id: "bitcoin".into(),
            block_time_minutes: Some(10),
            hashing_algorithm: Some("SHA-256".into()),
            ..Default::default()
        };
        let stats = build_extra_stats(&bitcoin(), Some(&detail));
        assert_eq!(stats[4].value, "10");
        assert_eq!(stats[5].value, "SHA-256");

        let detail = AssetDetail {
            block_time_minutes: Some(0),
            ..detail
        };
        let stats = build_extra_stats(&bitcoin(), Some(&detail));
        assert_eq!(stats[4].value, "n/a");
    }

    #[test]
    fn test_global_stats_absent() {
        let holdings = vec![bitcoin().with_owned_quantity(1.0)];
        assert!(build_global_stats(None, &holdings).is_empty());
    }

    #[test]
    fn test_global_stats_portfolio_value() {
        let asset = AssetRecord {
            id: "bitcoin".into(),
            price_usd: 100.0,
            rank: Some(1.0),
            ..Default::default()
        };
        let stats = build_global_stats(Some(&global()), &[asset.with_owned_quantity(2.0)]);
        assert_eq!(
            values(&stats),
            vec![
                ("Market Cap", "$2.10T"),
                ("24h Volume", "$95.00B"),
                ("BTC Dominance", "52.10%"),
                ("Portfolio Value", "$200.00"),
            ]
        );
        assert_eq!(stats[0].percent_delta, Some(-0.5 / 100.0));
        assert_eq!(stats[1].percent_delta, None);
        assert_eq!(stats[2].percent_delta, None);
        assert_eq!(stats[3].percent_delta, Some(0.0));
    }

    #[test]
    fn test_portfolio_delta() {
        let asset = AssetRecord {
            id: "eth".into(),
            price_usd: 110.0,
            day_change_percent: Some(10.0),
            ..Default::default()
        };
        let (total, delta) = portfolio_value(&[asset.with_owned_quantity(1.0)]);
        assert_eq!(total, 110.0);
        assert!((delta.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_asset_and_portfolio_deltas_share_units() {
        let asset = AssetRecord {
            id: "eth".into(),
            price_usd: 110.0,
            day_change_percent: Some(10.0),
            ..Default::default()
        };
        let price = &build_overview_stats(&asset)[0];
        let portfolio = &build_global_stats(Some(&global()), &[asset.with_owned_quantity(1.0)])[3];

        let price_delta = price.percent_delta.unwrap();
        let portfolio_delta = portfolio.percent_delta.unwrap();
        assert!((price_delta - 0.1).abs() < 1e-12);
        assert!((price_delta - portfolio_delta).abs() < 1e-12);

        assert!(price.to_string().contains("+10.00%"));
        assert!(portfolio.to_string().contains("+10.00%"));
        assert!(build_global_stats(Some(&global()), &[])[0]
            .to_string()
            .contains("-0.50%"));
    }

    #[test]
    fn test_portfolio_delta_zero_prior_is_absent() {
        assert_eq!(portfolio_value(&[]), (0.0, None));

        let asset = AssetRecord {
            id: "free".into(),
            price_usd: 0.0,
            day_change_percent: Some(5.0),
            ..Default::default()
        };
        let (total, delta) = portfolio_value(&[asset.with_owned_quantity(10.0)]);
        assert_eq!(total, 0.0);
        assert_eq!(delta, None);
    }

    #[test]
    fn test_portfolio_delta_full_loss_is_finite() {
        let asset = AssetRecord {
            id: "rug".into(),
            price_usd: 5.0,
            day_change_percent: Some(-100.0),
            ..Default::default()
        };
        let (_, delta) = portfolio_value(&[asset.with_owned_quantity(1.0)]);
        assert_eq!(delta, Some(0.0));
    }
}
