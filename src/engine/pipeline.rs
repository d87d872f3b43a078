use std::collections::HashMap;

use crate::asset::AssetRecord;
use crate::engine::SortMode;
use crate::store::HoldingRecord;

/// Case insensitive substring match on name, ticker or id. An empty query
/// keeps every asset in its original order.
pub fn filter_assets(assets: &[AssetRecord], query: &str) -> Vec<AssetRecord> {
    if query.is_empty() {
        return assets.to_vec();
    }
    let query = query.to_lowercase();
    assets
        .iter()
        .filter(|asset| {
            asset.full_name.to_lowercase().contains(&query)
                || asset.ticker.to_lowercase().contains(&query)
                || asset.id.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Note the price modes: `PriceAsc` puts the most expensive asset first and
/// `PriceDesc` the cheapest.
pub fn sort_assets(assets: &mut [AssetRecord], sort_mode: SortMode) {
    match sort_mode {
        SortMode::RankAsc | SortMode::HoldingsAsc => {
            assets.sort_by_key(|asset| asset.rank_as_int());
        }
        SortMode::RankDesc | SortMode::HoldingsDesc => {
            assets.sort_by(|a, b| b.rank_as_int().cmp(&a.rank_as_int()));
        }
        SortMode::PriceAsc => {
            assets.sort_by(|a, b| b.price_usd.total_cmp(&a.price_usd));
        }
        SortMode::PriceDesc => {
            assets.sort_by(|a, b| a.price_usd.total_cmp(&b.price_usd));
        }
    }
}

pub fn filter_and_sort(assets: &[AssetRecord], query: &str, sort_mode: SortMode) -> Vec<AssetRecord> {
    let mut filtered = filter_assets(assets, query);
    sort_assets(&mut filtered, sort_mode);
    filtered
}

/// Assets of `assets` that have a holding, with the owned quantity set.
/// Keeps the order of `assets`; ids match exactly.
pub fn merge_holdings(assets: &[AssetRecord], holdings: &[HoldingRecord]) -> Vec<AssetRecord> {
    let quantities: HashMap<&str, f64> = holdings
        .iter()
        .map(|holding| (holding.asset_id.as_str(), holding.quantity))
        .collect();

    assets
        .iter()
        .filter_map(|asset| {
            quantities
                .get(asset.id.as_str())
                .map(|quantity| asset.with_owned_quantity(*quantity))
        })
        .collect()
}

pub fn sort_holdings_if_needed(holdings: &mut [AssetRecord], sort_mode: SortMode) {
    match sort_mode {
        SortMode::HoldingsAsc => {
            holdings.sort_by(|a, b| a.owned_value().total_cmp(&b.owned_value()));
        }
        SortMode::HoldingsDesc => {
            holdings.sort_by(|a, b| b.owned_value().total_cmp(&a.owned_value()));
        }
        _ => {}
    }
}
