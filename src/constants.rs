//! Constants for the market overview sync engine
//!
//! Compile-time defaults for every setting. `EngineConfig::default()` is built
//! from these, and `EngineConfig::from_env()` only overrides what is set.

/// How often the engine refreshes the market overview (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 30;

/// How long before a snapshot is considered stale by the health check (in seconds)
pub const STALE_THRESHOLD_SECS: u64 = 300;

/// HTTP request timeout when fetching market data (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Number of ranked entries requested per refresh
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size the upstream markets endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 250;

/// Quote currency used when none is configured
pub const DEFAULT_CURRENCY: &str = "usd";

/// Capacity of the engine's event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for ranked market listings
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// Sort order requested from the markets endpoint
pub const COINGECKO_MARKET_ORDER: &str = "market_cap_desc";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "market-overview-sdk/0.1.0";

/// Environment variable overriding the upstream base URL
pub const ENV_API_URL: &str = "MARKET_DATA_API_URL";

/// Environment variable overriding the quote currency
pub const ENV_CURRENCY: &str = "MARKET_DATA_CURRENCY";

/// Environment variable overriding the number of entries
pub const ENV_LIMIT: &str = "MARKET_DATA_LIMIT";

/// Environment variable overriding the refresh interval (seconds)
pub const ENV_REFRESH_SECS: &str = "MARKET_DATA_REFRESH_SECS";

/// Environment variable overriding the request timeout (seconds)
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "MARKET_DATA_REQUEST_TIMEOUT_SECS";
