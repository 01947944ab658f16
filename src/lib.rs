//! # Market Overview Sync SDK
//!
//! Keeps a ranked cryptocurrency market overview (top N assets by market cap)
//! current in memory, refreshed from CoinGecko on a fixed schedule.
//!
//! ## Usage
//!
//! ```no_run
//! use market_overview_sdk::{EngineConfig, MarketSyncEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MarketSyncEngine::new(EngineConfig::default())?;
//! engine.start()?;
//!
//! // Always returns a snapshot, empty until the first cycle lands
//! let snapshot = engine.current_snapshot();
//! for entry in &snapshot.entries {
//!     println!("#{} {}: ${:.2} ({:+.2}%)", entry.rank, entry.symbol, entry.price, entry.change_percent);
//! }
//! if snapshot.is_stale() {
//!     println!("(stale: {:?})", snapshot.error());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! MarketSyncEngine::start()
//!     ↓
//! Background task (first cycle immediately, then every 30s)
//!     ↓
//! MarketDataFetcher (CoinGecko /coins/markets)
//!     ↓
//! rank_records -> Snapshot
//!     ↓
//! SnapshotStore (Arc swap via watch channel)
//!     ↓
//! Your code (current_snapshot, subscribe, subscribe_events)
//! ```
//!
//! ## Error Handling
//!
//! Fetch failures never escape the engine. The previous entries stay
//! published with status `stale-after-error` and the cause attached:
//!
//! ```no_run
//! use market_overview_sdk::{FetchError, MarketSyncEngine};
//!
//! # fn example(engine: &MarketSyncEngine) {
//! match engine.current_snapshot().error() {
//!     None => println!("fresh"),
//!     Some(FetchError::HttpStatus(429)) => println!("rate limited, showing last data"),
//!     Some(e) => println!("showing last data after: {}", e),
//! }
//! # }
//! ```
//!
//! ## Configuration
//!
//! Defaults live in [`constants`]. `EngineConfig::from_env()` honours
//! `MARKET_DATA_API_URL`, `MARKET_DATA_CURRENCY`, `MARKET_DATA_LIMIT`,
//! `MARKET_DATA_REFRESH_SECS` and `MARKET_DATA_REQUEST_TIMEOUT_SECS`.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod fetchers;
pub mod metrics;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{EngineConfig, QuoteCurrency};
pub use engine::MarketSyncEngine;
pub use error::{ConfigError, EngineError, FetchError};
pub use fetcher::MarketDataFetcher;
pub use fetchers::CoinGeckoFetcher;
pub use metrics::CycleMetrics;
pub use types::{
    ComponentHealth, EngineState, HealthStatus, MarketDataEvent, RankedEntry, RawMarketRecord,
    Snapshot, SnapshotStatus,
};
