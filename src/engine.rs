//! Market overview sync engine
//!
//! Owns the refresh schedule, drives the fetcher and publishes snapshots.

use crate::{
    config::EngineConfig,
    error::{ConfigError, EngineError},
    fetcher::MarketDataFetcher,
    fetchers::CoinGeckoFetcher,
    metrics::{CycleMetrics, MetricsCollector},
    store::SnapshotStore,
    types::{
        rank_records, ComponentHealth, EngineState, HealthStatus, MarketDataEvent, Snapshot,
    },
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Market overview sync engine
///
/// Periodically fetches the ranked market listing, transforms it into
/// [`RankedEntry`](crate::types::RankedEntry) values and publishes a new
/// [`Snapshot`] for observers.
///
/// Lifecycle is `Idle -> Running -> Stopped`. A stopped engine cannot be
/// restarted; build a new one instead.
///
/// # Example
/// ```no_run
/// use market_overview_sdk::{EngineConfig, MarketSyncEngine};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = MarketSyncEngine::new(EngineConfig::default())?;
/// engine.start()?;
///
/// let mut updates = engine.subscribe();
/// updates.wait_for(|snapshot| !snapshot.is_empty()).await?;
/// for entry in &engine.current_snapshot().entries {
///     println!("{:>2} {:<6} ${:.2}", entry.rank, entry.symbol, entry.price);
/// }
///
/// engine.stop();
/// # Ok(())
/// # }
/// ```
pub struct MarketSyncEngine {
    inner: Arc<EngineInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the engine handle and its background task
struct EngineInner {
    config: EngineConfig,
    fetcher: Arc<dyn MarketDataFetcher>,
    store: SnapshotStore,
    metrics: MetricsCollector,
    state: Mutex<EngineState>,
    cancel: CancellationToken,
    /// Held for the duration of a refresh cycle so cycles never overlap
    cycle_guard: tokio::sync::Mutex<()>,
}

impl MarketSyncEngine {
    /// Creates an engine backed by the CoinGecko fetcher
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fetcher = Arc::new(CoinGeckoFetcher::from_config(&config)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Creates an engine configured from `MARKET_DATA_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(EngineConfig::from_env()?)
    }

    /// Creates an engine with a custom fetcher
    ///
    /// This is primarily for testing with mock fetchers.
    pub fn with_fetcher(
        config: EngineConfig,
        fetcher: Arc<dyn MarketDataFetcher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let metrics = MetricsCollector::new(fetcher.fetcher_name());

        let inner = EngineInner {
            config,
            fetcher,
            store: SnapshotStore::new(),
            metrics,
            state: Mutex::new(EngineState::Idle),
            cancel: CancellationToken::new(),
            cycle_guard: tokio::sync::Mutex::new(()),
        };

        Ok(Self {
            inner: Arc::new(inner),
            task: Mutex::new(None),
        })
    }

    /// Starts the refresh schedule
    ///
    /// The first cycle runs immediately, then one every refresh interval.
    /// Calling `start` on a running engine is a no-op. Calling it on a
    /// stopped engine returns [`EngineError::Stopped`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<(), EngineError> {
        {
            let mut state = self.inner.lock_state();
            match *state {
                EngineState::Running => {
                    tracing::debug!("Market sync engine already running");
                    return Ok(());
                }
                EngineState::Stopped => return Err(EngineError::Stopped),
                EngineState::Idle => {}
            }
            *state = EngineState::Running;
            self.inner.store.restamp_initial();

            let handle = tokio::spawn(EngineInner::run_schedule(self.inner.clone()));
            *self.lock_task() = Some(handle);
        }

        tracing::info!(
            fetcher = self.inner.fetcher.fetcher_name(),
            refresh_interval_secs = self.inner.config.refresh_interval.as_secs(),
            limit = self.inner.config.limit,
            currency = %self.inner.config.currency,
            "Started market sync engine"
        );
        self.inner
            .store
            .emit(MarketDataEvent::state_changed(EngineState::Running));

        Ok(())
    }

    /// Stops the refresh schedule
    ///
    /// After this returns no further snapshot is published, including the
    /// result of a fetch that is still in flight. No-op unless running.
    pub fn stop(&self) {
        {
            let mut state = self.inner.lock_state();
            if *state != EngineState::Running {
                return;
            }
            *state = EngineState::Stopped;
            self.inner.cancel.cancel();
        }

        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }

        tracing::info!("Stopped market sync engine");
        self.inner
            .store
            .emit(MarketDataEvent::state_changed(EngineState::Stopped));
    }

    /// Returns the current lifecycle state
    pub fn state(&self) -> EngineState {
        *self.inner.lock_state()
    }

    /// Returns the latest published snapshot without waiting
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.current()
    }

    /// Subscribes to snapshot replacements
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.store.subscribe()
    }

    /// Subscribes to market data events
    ///
    /// `SnapshotPublished` is sent exactly once per successful cycle.
    pub fn subscribe_events(&self) -> broadcast::Receiver<MarketDataEvent> {
        self.inner.store.subscribe_events()
    }

    /// Forces an immediate refresh cycle
    ///
    /// Waits for an in-flight cycle to finish rather than overlapping it.
    ///
    /// # Returns
    /// The snapshot current after the cycle, which is stale if the fetch failed
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>, EngineError> {
        self.ensure_running()?;

        let _guard = self.inner.cycle_guard.lock().await;
        self.ensure_running()?;
        self.inner.run_cycle().await;

        Ok(self.current_snapshot())
    }

    /// Returns the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns the name of the fetcher in use
    pub fn fetcher_name(&self) -> &str {
        self.inner.fetcher.fetcher_name()
    }

    /// Gets refresh cycle metrics including latency percentiles and success rate
    pub async fn cycle_metrics(&self) -> CycleMetrics {
        self.inner.metrics.get_metrics().await
    }

    /// Perform a health check on the sync engine
    ///
    /// # Returns
    /// ComponentHealth indicating whether fresh market data is available
    pub async fn health_check(&self) -> ComponentHealth {
        let snapshot = self.current_snapshot();
        let state = self.state();
        let mut details = std::collections::HashMap::new();

        details.insert("entries".to_string(), serde_json::json!(snapshot.len()));
        details.insert("state".to_string(), serde_json::json!(state));
        details.insert(
            "snapshot_status".to_string(),
            serde_json::json!(snapshot.status),
        );
        details.insert(
            "age_secs".to_string(),
            serde_json::json!(snapshot.age().as_secs()),
        );
        details.insert(
            "fetcher_name".to_string(),
            serde_json::json!(self.fetcher_name()),
        );
        if let Some(error) = snapshot.error() {
            details.insert("last_error".to_string(), serde_json::json!(error));
        }

        let too_old = snapshot.is_older_than(self.inner.config.stale_threshold);
        let status = if snapshot.is_empty() {
            HealthStatus::Unhealthy
        } else if snapshot.is_stale() || too_old {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let message = match status {
            HealthStatus::Healthy => format!(
                "Market sync engine is {} with {} fresh entries",
                state,
                snapshot.len()
            ),
            HealthStatus::Degraded => match snapshot.error() {
                Some(error) => format!("Showing stale market data after error: {}", error),
                None => format!("Market data is {}s old", snapshot.age().as_secs()),
            },
            HealthStatus::Unhealthy => "Market sync engine has no market data".to_string(),
        };

        ComponentHealth {
            name: "market_sync_engine".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        match self.state() {
            EngineState::Running => Ok(()),
            EngineState::Stopped => Err(EngineError::Stopped),
            EngineState::Idle => Err(EngineError::NotRunning),
        }
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MarketSyncEngine {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
    }
}

impl EngineInner {
    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Background task: one cycle per tick until cancelled
    async fn run_schedule(inner: Arc<EngineInner>) {
        let mut ticker = tokio::time::interval(inner.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = inner.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match inner.cycle_guard.try_lock() {
                        Ok(_guard) => inner.run_cycle().await,
                        Err(_) => {
                            tracing::debug!("Refresh cycle in flight, skipping tick");
                            inner.metrics.record_skipped_tick().await;
                        }
                    }
                }
            }
        }

        tracing::debug!("Market sync schedule exited");
    }

    /// Runs one fetch-transform-publish cycle
    ///
    /// Callers must hold `cycle_guard`.
    async fn run_cycle(&self) {
        let started = Instant::now();

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("Refresh cycle cancelled before fetch completed");
                return;
            }
            result = self.fetcher.fetch(self.config.limit, &self.config.currency) => result,
        };
        let success = result.is_ok();

        if !self.is_running() {
            tracing::debug!("Discarding refresh result, engine not running");
            return;
        }

        // Counted before publishing
        tracing::debug!(
            success,
            latency_ms = started.elapsed().as_millis() as u64,
            "Refresh cycle finished"
        );
        self.metrics.record_cycle(started.elapsed(), success).await;

        // Publishing under the state lock means stop() either happened
        // before this check or waits until the publish is done.
        let state = self.lock_state();
        if *state != EngineState::Running {
            let current = *state;
            tracing::debug!(state = %current, "Discarding refresh result");
            return;
        }

        match result {
            Ok(records) => {
                self.store.publish(rank_records(records));
            }
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    kind = error.kind(),
                    fetcher = self.fetcher.fetcher_name(),
                    "Market refresh failed, keeping previous entries"
                );
                self.store.mark_stale(error);
            }
        }
    }

    fn is_running(&self) -> bool {
        *self.lock_state() == EngineState::Running
    }
}
