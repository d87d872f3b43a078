//! Externally sourced values, each refreshed independently.
//!
//! A refresh spawns one fetch and never cancels or waits for an earlier one.
//! Whichever fetch completes last wins, even when it was started first: there
//! is no staleness guard. Failures are logged and leave the current value as
//! it was.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::asset::{AssetDetail, AssetRecord, GlobalStats};
use crate::error::Result;
use crate::market::MarketDataApi;
use crate::observable::{Observable, Subscription};

type Fetch<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

pub struct RemoteSource<T> {
    name: String,
    fetch: Fetch<T>,
    value: Observable<Option<Arc<T>>>,
}

pub type AssetListSource = RemoteSource<Vec<AssetRecord>>;
pub type GlobalStatsSource = RemoteSource<GlobalStats>;
pub type AssetDetailSource = RemoteSource<AssetDetail>;

impl<T: Send + Sync + 'static> RemoteSource<T> {
    pub fn new<F, Fut>(name: &str, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            fetch: Arc::new(move || fetch().boxed()),
            value: Observable::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latest successfully fetched value.
    pub fn current(&self) -> Option<Arc<T>> {
        self.value.current()
    }

    /// Notified once per successful fetch, current value replayed first.
    pub fn subscribe(&self) -> Subscription<Option<Arc<T>>> {
        self.value.subscribe()
    }

    pub fn refresh(&self) -> JoinHandle<()> {
        let name = self.name.clone();
        let fetch = (self.fetch)();
        let value = self.value.clone();
        tokio::spawn(async move {
            match fetch.await {
                Ok(fetched) => {
                    debug!("Refreshed {name}");
                    value.publish(Some(Arc::new(fetched)));
                }
                Err(err) => {
                    error!("Failed refreshing {name} : {err}");
                }
            }
        })
    }
}

impl AssetListSource {
    pub fn asset_list(api: Arc<dyn MarketDataApi>) -> Self {
        Self::new("asset list", move || {
            let api = api.clone();
            async move { api.get_assets().await }
        })
    }
}

impl GlobalStatsSource {
    pub fn global_stats(api: Arc<dyn MarketDataApi>) -> Self {
        Self::new("global stats", move || {
            let api = api.clone();
            async move { api.get_global_stats().await }
        })
    }
}

impl AssetDetailSource {
    /// Bound to one asset for its whole life, fetched right away.
    pub fn asset_detail(api: Arc<dyn MarketDataApi>, asset_id: &str) -> Self {
        let id = asset_id.to_string();
        let source = Self::new(format!("asset detail {asset_id}").as_str(), move || {
            let api = api.clone();
            let id = id.clone();
            async move { api.get_asset_detail(&id).await }
        });
        source.refresh();
        source
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::market::fake::FakeMarket;

    fn asset(id: &str, price: f64) -> AssetRecord {
        AssetRecord {
            id: id.into(),
            price_usd: price,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_once() {
        let market = Arc::new(FakeMarket::new());
        market.push_assets(Duration::ZERO, Some(vec![asset("bitcoin", 100.0)]));
        let source = AssetListSource::asset_list(market.clone());
        assert!(source.current().is_none());

        let mut sub = source.subscribe();
        assert!(sub.next().await.unwrap().is_none());

        source.refresh().await.unwrap();
        let published = sub.next().await.unwrap().unwrap();
        assert_eq!(published[0].id, "bitcoin");
        assert_eq!(source.current().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_value() {
        let market = Arc::new(FakeMarket::new());
        market
            .push_assets(Duration::ZERO, Some(vec![asset("bitcoin", 100.0)]))
            .push_assets(Duration::ZERO, None);
        let source = AssetListSource::asset_list(market.clone());

        source.refresh().await.unwrap();
        source.refresh().await.unwrap();

        assert_eq!(source.current().unwrap()[0].price_usd, 100.0);
        assert_eq!(market.asset_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_before_first_success_stays_absent() {
        let market = Arc::new(FakeMarket::new());
        let source = GlobalStatsSource::global_stats(market);
        source.refresh().await.unwrap();
        assert!(source.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_older_refresh_still_commits() {
        let market = Arc::new(FakeMarket::new());
        market
            .push_assets(Duration::from_millis(200), Some(vec![asset("old", 1.0)]))
            .push_assets(Duration::from_millis(10), Some(vec![asset("new", 2.0)]));
        let source = AssetListSource::asset_list(market);

        let older = source.refresh();
        let newer = source.refresh();
        newer.await.unwrap();
        assert_eq!(source.current().unwrap()[0].id, "new");

        older.await.unwrap();
        assert_eq!(source.current().unwrap()[0].id, "old");
    }

    #[tokio::test]
    async fn test_detail_fetches_on_construction() {
        let market = Arc::new(FakeMarket::new());
        market.set_detail(AssetDetail {
            id: "bitcoin".into(),
            hashing_algorithm: Some("SHA-256".into()),
            ..Default::default()
        });
        let source = AssetDetailSource::asset_detail(market, "bitcoin");
        assert_eq!(source.name(), "asset detail bitcoin");

        let mut sub = source.subscribe();
        let mut detail = sub.next().await.unwrap();
        if detail.is_none() {
            detail = sub.next().await.unwrap();
        }
        assert_eq!(detail.unwrap().hashing_algorithm.as_deref(), Some("SHA-256"));
    }
}
