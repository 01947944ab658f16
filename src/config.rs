//! Engine configuration
//!
//! Defaults come from [`crate::constants`]. A handful of environment variables
//! can override them at startup via [`EngineConfig::from_env`].

use crate::{
    constants::{
        COINGECKO_API_URL, DEFAULT_CURRENCY, DEFAULT_LIMIT, ENV_API_URL, ENV_CURRENCY, ENV_LIMIT,
        ENV_REFRESH_SECS, ENV_REQUEST_TIMEOUT_SECS, MAX_PAGE_SIZE, REFRESH_INTERVAL_SECS,
        REQUEST_TIMEOUT_SECS, STALE_THRESHOLD_SECS,
    },
    error::ConfigError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A quote currency code such as `usd` or `eur`
///
/// Always three ASCII letters, stored lowercase as the upstream expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuoteCurrency(String);

impl QuoteCurrency {
    /// Parses and normalizes a currency code
    pub fn parse(code: &str) -> Result<Self, ConfigError> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Lowercase code as sent upstream
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QuoteCurrency {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }
}

impl FromStr for QuoteCurrency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QuoteCurrency {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QuoteCurrency> for String {
    fn from(value: QuoteCurrency) -> Self {
        value.0
    }
}

impl fmt::Display for QuoteCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_ascii_uppercase())
    }
}

/// Settings for the sync engine and its HTTP fetcher
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Upstream API base URL (no trailing slash)
    pub base_url: String,
    /// Quote currency for prices
    pub currency: QuoteCurrency,
    /// Number of ranked entries to request
    pub limit: u32,
    /// Time between scheduled refresh cycles
    pub refresh_interval: Duration,
    /// HTTP request timeout for a single fetch
    pub request_timeout: Duration,
    /// Age after which the health check reports degraded data
    pub stale_threshold: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
            currency: QuoteCurrency::default(),
            limit: DEFAULT_LIMIT,
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            stale_threshold: Duration::from_secs(STALE_THRESHOLD_SECS),
        }
    }
}

impl EngineConfig {
    /// Builds a config from defaults overridden by `MARKET_DATA_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config = config.with_base_url(url);
        }
        if let Some(code) = lookup(ENV_CURRENCY) {
            config.currency = QuoteCurrency::parse(&code)?;
        }
        if let Some(value) = lookup(ENV_LIMIT) {
            config.limit = parse_env(ENV_LIMIT, &value)?;
        }
        if let Some(value) = lookup(ENV_REFRESH_SECS) {
            config.refresh_interval = Duration::from_secs(parse_env(ENV_REFRESH_SECS, &value)?);
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout =
                Duration::from_secs(parse_env(ENV_REQUEST_TIMEOUT_SECS, &value)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the upstream base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim().trim_end_matches('/').to_string();
        self
    }

    /// Sets the quote currency
    pub fn with_currency(mut self, currency: QuoteCurrency) -> Self {
        self.currency = currency;
        self
    }

    /// Sets the number of ranked entries
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the refresh interval
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Sets the HTTP request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the health check stale threshold
    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold = threshold;
        self
    }

    /// Checks that every setting is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.base_url.clone()));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidLimit {
                limit: self.limit,
                max: MAX_PAGE_SIZE,
            });
        }
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("refresh interval"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("request timeout"));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env(var, value))
}
