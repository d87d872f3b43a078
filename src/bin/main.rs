use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::select;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coin_tracker::config::{Config, ConfigArgs};
use coin_tracker::engine::ViewState;
use coin_tracker::image_cache::ImageCache;
use coin_tracker::market::coingecko::CoinGecko;
use coin_tracker::source::{AssetDetailSource, AssetListSource, GlobalStatsSource};
use coin_tracker::stats::{build_extra_stats, build_overview_stats};
use coin_tracker::store::JsonFileRepository;
use coin_tracker::utils::{currency_2, currency_2_to_6, percent};
use coin_tracker::*;

const DETAIL_WAIT: Duration = Duration::from_secs(35);

#[derive(Parser, Debug)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List market assets
    Markets {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value = "rank-asc")]
        sort: SortMode,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show holdings and global stats
    Portfolio {
        #[arg(long, default_value = "holdings-desc")]
        sort: SortMode,
    },
    /// Set the owned quantity of an asset, 0 removes it
    Hold { asset_id: String, quantity: f64 },
    /// Show details of one asset
    Detail { asset_id: String },
    /// Refresh periodically and print the portfolio
    Watch {
        #[arg(long, default_value_t = 60)]
        interval: u64,
        #[arg(long, default_value = "holdings-desc")]
        sort: SortMode,
    },
    /// Download or read the cached icon of an asset
    Icon { asset_id: String },
}

struct App {
    config: Config,
    api: Arc<CoinGecko>,
    sources: EngineSources,
}

impl App {
    async fn new(config: Config) -> Result<Self> {
        let api = Arc::new(CoinGecko::new(&config.endpoint)?);
        let holdings = HoldingsStore::new(Arc::new(JsonFileRepository::in_dir(&config.data_dir)));
        holdings.load().await?;
        let sources = EngineSources {
            assets: Arc::new(AssetListSource::asset_list(api.clone())),
            global: Arc::new(GlobalStatsSource::global_stats(api.clone())),
            holdings: Arc::new(holdings),
        };
        Ok(Self {
            config,
            api,
            sources,
        })
    }

    /// Fetches both remote sources, then waits for the engine's first full pass.
    async fn snapshot(&self, query: &str, sort_mode: SortMode) -> Result<ViewState> {
        self.sources.assets.refresh().await?;
        self.sources.global.refresh().await?;
        if self.sources.assets.current().is_none() {
            return Err(anyhow!("Could not fetch the asset list"));
        }

        let engine = Engine::spawn(self.sources.clone(), self.config.engine(query, sort_mode));
        let mut assets = engine.subscribe_assets();
        // Skip the replayed empty view, the next one is the debounced pass.
        assets.next().await;
        assets.next().await;
        let view = engine.view();
        engine.shutdown().await;
        Ok(view)
    }

    async fn find_asset(&self, asset_id: &str) -> Result<AssetRecord> {
        if self.sources.assets.current().is_none() {
            self.sources.assets.refresh().await?;
        }
        self.sources
            .assets
            .current()
            .and_then(|assets| assets.iter().find(|a| a.id == asset_id).cloned())
            .ok_or_else(|| anyhow!("Unknown asset {asset_id}"))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{}=info,reqwest=info", env!("CARGO_CRATE_NAME")).into()
        }))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::from(args.config);

    if let Err(err) = run(config, args.command).await {
        error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run(config: Config, command: Commands) -> Result<()> {
    let app = App::new(config).await?;

    match command {
        Commands::Markets { query, sort, limit } => {
            let view = app.snapshot(&query, sort).await?;
            print_assets(&view.assets[..limit.min(view.assets.len())]);
        }
        Commands::Portfolio { sort } => {
            let view = app.snapshot("", sort).await?;
            print_portfolio(&view);
        }
        Commands::Hold { asset_id, quantity } => {
            app.sources.holdings.upsert(&asset_id, quantity).await?;
            info!("Holding {asset_id} set to {quantity}");
        }
        Commands::Detail { asset_id } => run_detail(&app, &asset_id).await?,
        Commands::Watch { interval, sort } => run_watch(&app, interval, sort).await?,
        Commands::Icon { asset_id } => {
            let asset = app.find_asset(&asset_id).await?;
            let cache = ImageCache::new(app.api.clone(), &app.config.data_dir);
            let bytes = cache.load(&asset).await?;
            println!(
                "{} {} bytes at {}",
                asset.full_name.bold(),
                bytes.len(),
                cache.image_path(&asset.id).display()
            );
        }
    }

    Ok(())
}

async fn run_detail(app: &App, asset_id: &str) -> Result<()> {
    let asset = app.find_asset(asset_id).await?;
    let source = AssetDetailSource::asset_detail(app.api.clone(), asset_id);
    let mut updates = source.subscribe();

    let detail = tokio::time::timeout(DETAIL_WAIT, async {
        loop {
            match updates.next().await {
                Some(Some(detail)) => return Some(detail),
                Some(None) => continue,
                None => return None,
            }
        }
    })
    .await
    .ok()
    .flatten();

    println!(
        "{} ({})",
        asset.full_name.bold(),
        asset.ticker.to_uppercase()
    );
    println!("{}", "Overview".underline());
    for stat in build_overview_stats(&asset) {
        println!("  {stat}");
    }
    println!("{}", "Additional Details".underline());
    for stat in build_extra_stats(&asset, detail.as_deref()) {
        println!("  {stat}");
    }
    if let Some(detail) = detail {
        if let Some(homepage) = detail.homepage() {
            println!("Website: {homepage}");
        }
        if let Some(subreddit) = &detail.subreddit_url {
            println!("Reddit: {subreddit}");
        }
        if let Some(description) = detail.plain_description() {
            println!("\n{description}");
        }
    }
    Ok(())
}

async fn run_watch(app: &App, interval: u64, sort: SortMode) -> Result<()> {
    let engine = Engine::spawn(app.sources.clone(), app.config.engine("", sort));
    let mut stats = engine.subscribe_stats();
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));

    loop {
        select! {
            _ = ticker.tick() => {
                engine.refresh().await?;
            }
            Some(_) = stats.next() => {
                let view = engine.view();
                if !view.loading && !view.stats.is_empty() {
                    print_portfolio(&view);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}

fn colored_percent(value: Option<f64>) -> String {
    match value {
        Some(value) if value < 0.0 => percent(value).red().to_string(),
        Some(value) => percent(value).green().to_string(),
        None => "".to_string(),
    }
}

fn print_assets(assets: &[AssetRecord]) {
    for asset in assets {
        println!(
            "{:>4} {:<8} {:<24} {:>16} {:>10}",
            asset.rank_as_int(),
            asset.ticker.to_uppercase().bold(),
            asset.full_name,
            currency_2_to_6(asset.price_usd),
            colored_percent(asset.day_change_percent)
        );
    }
}

fn print_portfolio(view: &ViewState) {
    for stat in view.stats.iter() {
        println!("{stat}");
    }
    println!();
    for asset in view.holdings.iter() {
        println!(
            "{:<8} {:>16} {:>16} {:>10}",
            asset.ticker.to_uppercase().bold(),
            asset.owned_quantity.unwrap_or_default(),
            currency_2(asset.owned_value()),
            colored_percent(asset.day_change_percent)
        );
    }
}
