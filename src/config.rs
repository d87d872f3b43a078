use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::engine::{EngineConfig, SortMode};
use crate::market::coingecko::DEFAULT_ENDPOINT;

pub const DEFAULT_DATA_DIR: &str = ".coin-tracker";

/// Options shared by every command, read from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Base url of the market data api
    #[arg(long, env = "COINGECKO_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Directory holding the holdings file and the image cache
    #[arg(long, env = "COIN_TRACKER_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Quiet period before query and sort changes are applied
    #[arg(long, env = "COIN_TRACKER_DEBOUNCE_MS", default_value_t = 500)]
    pub debounce_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub data_dir: PathBuf,
    pub debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            debounce: Duration::from_millis(500),
        }
    }
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        Self {
            endpoint: args.endpoint,
            data_dir: args.data_dir,
            debounce: Duration::from_millis(args.debounce_ms),
        }
    }
}

impl Config {
    pub fn engine(&self, query: &str, sort_mode: SortMode) -> EngineConfig {
        EngineConfig {
            debounce: self.debounce,
            query: query.to_string(),
            sort_mode,
        }
    }
}
