//! The aggregation engine.
//!
//! One task owns every aggregation input and recomputes the published views
//! when any of them changes:
//!
//! 1. query, sort mode or raw assets change: after a quiet period, filter and
//!    sort the asset list,
//! 2. asset view or holdings change: merge holdings into the asset view,
//! 3. global stats or merged holdings change: rebuild the stats and clear the
//!    loading flag.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::asset::{AssetRecord, GlobalStats};
use crate::error::{Error, Result};
use crate::observable::{Observable, Subscription};
use crate::source::{AssetListSource, GlobalStatsSource};
use crate::stats::{build_global_stats, InfoStat};
use crate::store::{HoldingRecord, HoldingsStore};

pub mod pipeline;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SortMode {
    RankAsc,
    RankDesc,
    #[default]
    HoldingsAsc,
    HoldingsDesc,
    PriceAsc,
    PriceDesc,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub debounce: Duration,
    pub query: String,
    pub sort_mode: SortMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            query: String::new(),
            sort_mode: SortMode::default(),
        }
    }
}

/// The collaborators the engine reads from, shared with the rest of the app.
#[derive(Clone)]
pub struct EngineSources {
    pub assets: Arc<AssetListSource>,
    pub global: Arc<GlobalStatsSource>,
    pub holdings: Arc<HoldingsStore>,
}

/// Views published by the engine.
#[derive(Clone, Debug, Default)]
pub struct EngineOutputs {
    pub assets: Observable<Arc<Vec<AssetRecord>>>,
    pub holdings: Observable<Arc<Vec<AssetRecord>>>,
    pub stats: Observable<Arc<Vec<InfoStat>>>,
    pub loading: Observable<bool>,
}

/// Snapshot of every published view.
#[derive(Clone, Debug)]
pub struct ViewState {
    pub assets: Arc<Vec<AssetRecord>>,
    pub holdings: Arc<Vec<AssetRecord>>,
    pub stats: Arc<Vec<InfoStat>>,
    pub loading: bool,
}

#[derive(Debug)]
enum EngineCommand {
    SetQuery(String),
    SetSortMode(SortMode),
    Refresh,
    UpdateHolding {
        asset_id: String,
        quantity: f64,
        reply: oneshot::Sender<Result<()>>,
    },
    Shutdown,
}

pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
    outputs: EngineOutputs,
    task: JoinHandle<()>,
}

impl EngineHandle {
    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::EngineStopped)
    }

    pub async fn set_query(&self, query: &str) -> Result<()> {
        self.send(EngineCommand::SetQuery(query.to_string())).await
    }

    pub async fn set_sort_mode(&self, sort_mode: SortMode) -> Result<()> {
        self.send(EngineCommand::SetSortMode(sort_mode)).await
    }

    /// Refetches the asset list and global stats.
    pub async fn refresh(&self) -> Result<()> {
        self.send(EngineCommand::Refresh).await
    }

    /// Resolves once the holding is persisted; the views follow through the
    /// holdings notification.
    pub async fn update_holding(&self, asset_id: &str, quantity: f64) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::UpdateHolding {
            asset_id: asset_id.to_string(),
            quantity,
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::EngineStopped)?
    }

    pub fn outputs(&self) -> &EngineOutputs {
        &self.outputs
    }

    pub fn subscribe_assets(&self) -> Subscription<Arc<Vec<AssetRecord>>> {
        self.outputs.assets.subscribe()
    }

    pub fn subscribe_holdings(&self) -> Subscription<Arc<Vec<AssetRecord>>> {
        self.outputs.holdings.subscribe()
    }

    pub fn subscribe_stats(&self) -> Subscription<Arc<Vec<InfoStat>>> {
        self.outputs.stats.subscribe()
    }

    pub fn subscribe_loading(&self) -> Subscription<bool> {
        self.outputs.loading.subscribe()
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            assets: self.outputs.assets.current(),
            holdings: self.outputs.holdings.current(),
            stats: self.outputs.stats.current(),
            loading: self.outputs.loading.current(),
        }
    }

    pub async fn shutdown(self) {
        let _ = self.tx.send(EngineCommand::Shutdown).await;
        if let Err(err) = self.task.await {
            error!("Engine task failed : {err}");
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    sources: EngineSources,
    outputs: EngineOutputs,
    query: String,
    sort_mode: SortMode,
    raw_assets: Arc<Vec<AssetRecord>>,
    holding_records: Arc<Vec<HoldingRecord>>,
    global: Option<Arc<GlobalStats>>,
}

impl Engine {
    pub fn spawn(sources: EngineSources, config: EngineConfig) -> EngineHandle {
        let (tx, rx) = mpsc::channel(64);
        let outputs = EngineOutputs::default();
        let engine = Engine {
            query: config.query.clone(),
            sort_mode: config.sort_mode,
            config,
            sources,
            outputs: outputs.clone(),
            raw_assets: Arc::default(),
            holding_records: Arc::default(),
            global: None,
        };
        let task = tokio::spawn(engine.run(rx));
        EngineHandle { tx, outputs, task }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<EngineCommand>) {
        let mut assets_sub = self.sources.assets.subscribe();
        let mut global_sub = self.sources.global.subscribe();
        let mut holdings_sub = self.sources.holdings.subscribe();

        let debounce = tokio::time::sleep(self.config.debounce);
        tokio::pin!(debounce);
        let mut debounce_armed = false;

        info!("Engine started");

        loop {
            select! {
                command = rx.recv() => {
                    let Some(command) = command else { break };
                    match command {
                        EngineCommand::SetQuery(query) => {
                            self.query = query;
                            debounce.as_mut().reset(Instant::now() + self.config.debounce);
                            debounce_armed = true;
                        }
                        EngineCommand::SetSortMode(sort_mode) => {
                            self.sort_mode = sort_mode;
                            debounce.as_mut().reset(Instant::now() + self.config.debounce);
                            debounce_armed = true;
                        }
                        EngineCommand::Refresh => self.refresh(),
                        EngineCommand::UpdateHolding { asset_id, quantity, reply } => {
                            let holdings = self.sources.holdings.clone();
                            tokio::spawn(async move {
                                let result = holdings.upsert(&asset_id, quantity).await;
                                let _ = reply.send(result);
                            });
                        }
                        EngineCommand::Shutdown => break,
                    }
                }
                Some(assets) = assets_sub.next() => {
                    self.raw_assets = assets.unwrap_or_default();
                    debounce.as_mut().reset(Instant::now() + self.config.debounce);
                    debounce_armed = true;
                }
                Some(records) = holdings_sub.next() => {
                    self.holding_records = records;
                    self.recompute_holdings();
                }
                Some(global) = global_sub.next() => {
                    self.global = global;
                    self.recompute_stats();
                }
                () = &mut debounce, if debounce_armed => {
                    debounce_armed = false;
                    self.recompute_assets();
                }
            }
        }

        info!("Engine stopped");
    }

    fn refresh(&self) {
        self.outputs.loading.publish(true);
        self.sources.assets.refresh();
        self.sources.global.refresh();
    }

    fn recompute_assets(&mut self) {
        let assets = pipeline::filter_and_sort(&self.raw_assets, &self.query, self.sort_mode);
        debug!(
            "Asset view: {} of {} assets, query {:?}, sort {}",
            assets.len(),
            self.raw_assets.len(),
            self.query,
            self.sort_mode
        );
        self.outputs.assets.publish(Arc::new(assets));
        self.recompute_holdings();
    }

    fn recompute_holdings(&mut self) {
        let assets = self.outputs.assets.current();
        let mut holdings = pipeline::merge_holdings(&assets, &self.holding_records);
        pipeline::sort_holdings_if_needed(&mut holdings, self.sort_mode);
        self.outputs.holdings.publish(Arc::new(holdings));
        self.recompute_stats();
    }

    fn recompute_stats(&mut self) {
        let holdings = self.outputs.holdings.current();
        let stats = build_global_stats(self.global.as_deref(), &holdings);
        self.outputs.stats.publish(Arc::new(stats));
        self.outputs.loading.publish(false);
    }
}
