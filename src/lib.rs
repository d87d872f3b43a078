pub mod asset;
pub mod config;
pub mod engine;
pub mod error;
pub mod image_cache;
pub mod market;
pub mod observable;
pub mod source;
pub mod stats;
pub mod store;
pub mod utils;

pub use asset::{AssetDetail, AssetRecord, GlobalStats};
pub use engine::{Engine, EngineConfig, EngineHandle, EngineSources, SortMode};
pub use error::{Error, Result};
pub use stats::InfoStat;
pub use store::{HoldingRecord, HoldingsStore};
