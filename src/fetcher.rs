//! Fetcher abstraction for retrieving ranked market data from external APIs

use crate::{config::QuoteCurrency, error::FetchError, types::RawMarketRecord};
use async_trait::async_trait;

/// Trait for market data fetchers
///
/// A fetcher performs exactly one round trip per call. It does not retry and
/// keeps no state between calls; scheduling and retry belong to the engine.
#[async_trait]
pub trait MarketDataFetcher: Send + Sync {
    /// Fetches the top `limit` assets priced in `currency`
    ///
    /// # Arguments
    /// * `limit` - Number of ranked records to request, clamped to the upstream page cap
    /// * `currency` - Quote currency for prices
    ///
    /// # Returns
    /// Records in upstream order (rank by market cap), or the reason the fetch failed.
    /// An empty upstream list is reported as [`FetchError::EmptyResult`].
    async fn fetch(
        &self,
        limit: u32,
        currency: &QuoteCurrency,
    ) -> Result<Vec<RawMarketRecord>, FetchError>;

    /// Returns the name of this fetcher
    fn fetcher_name(&self) -> &'static str;
}
