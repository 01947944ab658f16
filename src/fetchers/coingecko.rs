//! CoinGecko markets fetcher implementation

use crate::{
    config::{EngineConfig, QuoteCurrency},
    constants::{
        COINGECKO_API_URL, COINGECKO_MARKETS_ENDPOINT, COINGECKO_MARKET_ORDER, MAX_PAGE_SIZE,
        REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::{ConfigError, FetchError},
    fetcher::MarketDataFetcher,
    types::RawMarketRecord,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// CoinGecko `/coins/markets` fetcher
pub struct CoinGeckoFetcher {
    client: Client,
    base_url: String,
}

impl CoinGeckoFetcher {
    /// Creates a fetcher against the public CoinGecko API
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_settings(
            COINGECKO_API_URL,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Creates a fetcher using the base URL and timeout from `config`
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::with_settings(&config.base_url, config.request_timeout)
    }

    fn with_settings(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the markets URL for one page of ranked assets
    fn build_url(&self, limit: u32, currency: &QuoteCurrency) -> String {
        format!(
            "{}{}?vs_currency={}&order={}&per_page={}&page=1&sparkline=false",
            self.base_url,
            COINGECKO_MARKETS_ENDPOINT,
            currency.as_str(),
            COINGECKO_MARKET_ORDER,
            limit.clamp(1, MAX_PAGE_SIZE)
        )
    }
}

/// Maps a response status to an error if it is not a success
fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::HttpStatus(status.as_u16()))
    }
}

/// Decodes and validates a markets response body
fn decode_body(body: &str) -> Result<Vec<RawMarketRecord>, FetchError> {
    let records: Vec<RawMarketRecord> = serde_json::from_str(body)
        .map_err(|e| FetchError::Decode(format!("Failed to parse CoinGecko response: {}", e)))?;

    if records.is_empty() {
        return Err(FetchError::EmptyResult);
    }

    if let Some(bad) = records
        .iter()
        .find(|r| !r.current_price.is_finite() || r.current_price < 0.0)
    {
        return Err(FetchError::Decode(format!(
            "Invalid price {} for {}",
            bad.current_price, bad.symbol
        )));
    }

    Ok(records)
}

#[async_trait]
impl MarketDataFetcher for CoinGeckoFetcher {
    async fn fetch(
        &self,
        limit: u32,
        currency: &QuoteCurrency,
    ) -> Result<Vec<RawMarketRecord>, FetchError> {
        let url = self.build_url(limit, currency);
        tracing::debug!(url = %url, "Fetching market overview from CoinGecko");

        let response = self.client.get(&url).send().await?;

        check_status(response.status())?;

        let body = response.text().await?;

        let records = decode_body(&body)?;

        tracing::debug!(
            count = records.len(),
            "Successfully fetched market records from CoinGecko"
        );

        Ok(records)
    }

    fn fetcher_name(&self) -> &'static str {
        "coingecko"
    }
}
