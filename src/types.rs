//! Types for the market overview sync engine

use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One market entry as received from the upstream provider
///
/// Unknown fields in the upstream payload are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMarketRecord {
    /// Ticker symbol, usually lowercase upstream (e.g. "btc")
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Current price in the quote currency
    pub current_price: f64,

    /// 24h price change percentage, absent or null for some assets
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

/// Canonical display unit for one ranked asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based position in upstream order
    pub rank: u32,

    /// Uppercased ticker symbol
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Price in the quote currency
    pub price: f64,

    /// 24h change percentage, 0 when upstream did not report one
    pub change_percent: f64,
}

impl RankedEntry {
    /// Builds an entry from a raw record at the given 1-based rank
    pub fn from_raw(rank: u32, record: RawMarketRecord) -> Self {
        Self {
            rank,
            symbol: record.symbol.to_uppercase(),
            name: record.name,
            price: record.current_price,
            change_percent: record.price_change_percentage_24h.unwrap_or(0.0),
        }
    }
}

/// Maps raw records to ranked entries, preserving upstream order
pub fn rank_records(records: Vec<RawMarketRecord>) -> Vec<RankedEntry> {
    records
        .into_iter()
        .zip(1u32..)
        .map(|(record, rank)| RankedEntry::from_raw(rank, record))
        .collect()
}

/// Freshness status of a published snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotStatus {
    /// Entries come from the most recent refresh cycle
    Ok,
    /// The most recent refresh cycle failed; entries are from an earlier one
    StaleAfterError,
}

/// The failure that made a snapshot stale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshFailure {
    /// What went wrong
    pub cause: FetchError,

    /// When the failed cycle finished
    pub occurred_at: DateTime<Utc>,
}

/// Immutable published view of the ranked market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ranked entries, `rank` exactly `1..=len`
    pub entries: Vec<RankedEntry>,

    /// When the entries were produced
    pub produced_at: DateTime<Utc>,

    /// Freshness status
    pub status: SnapshotStatus,

    /// Most recent failure, set only while stale
    pub last_failure: Option<RefreshFailure>,
}

impl Snapshot {
    /// Creates the initial empty snapshot
    pub fn empty(produced_at: DateTime<Utc>) -> Self {
        Self::ok(Vec::new(), produced_at)
    }

    /// Creates a fresh snapshot from ranked entries
    pub fn ok(entries: Vec<RankedEntry>, produced_at: DateTime<Utc>) -> Self {
        Self {
            entries,
            produced_at,
            status: SnapshotStatus::Ok,
            last_failure: None,
        }
    }

    /// Returns a stale copy of this snapshot carrying the failure
    ///
    /// Entries and `produced_at` are kept so observers still see the last good data.
    pub fn mark_stale(&self, cause: FetchError, occurred_at: DateTime<Utc>) -> Self {
        Self {
            entries: self.entries.clone(),
            produced_at: self.produced_at,
            status: SnapshotStatus::StaleAfterError,
            last_failure: Some(RefreshFailure { cause, occurred_at }),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries have been published yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the last refresh cycle failed
    pub fn is_stale(&self) -> bool {
        self.status == SnapshotStatus::StaleAfterError
    }

    /// Cause of the last failed cycle, if stale
    pub fn error(&self) -> Option<&FetchError> {
        self.last_failure.as_ref().map(|f| &f.cause)
    }

    /// Age of the entries
    pub fn age(&self) -> std::time::Duration {
        let now = Utc::now();
        let duration = now.signed_duration_since(self.produced_at);
        std::time::Duration::from_secs(duration.num_seconds().max(0) as u64)
    }

    /// Check if the entries are older than `threshold`
    pub fn is_older_than(&self, threshold: std::time::Duration) -> bool {
        self.age() > threshold
    }

    /// Looks up an entry by symbol, ignoring case
    pub fn find(&self, symbol: &str) -> Option<&RankedEntry> {
        self.entries
            .iter()
            .find(|entry| entry.symbol.eq_ignore_ascii_case(symbol))
    }
}

/// Lifecycle state of the sync engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Constructed, schedule not armed
    Idle,
    /// Schedule active
    Running,
    /// Schedule cancelled; terminal
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Market data events broadcast to observers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketDataEvent {
    /// A new snapshot was published after a successful cycle
    SnapshotPublished {
        id: Uuid,
        entry_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A refresh cycle failed and the snapshot was marked stale
    RefreshFailed {
        id: Uuid,
        error: FetchError,
        timestamp: DateTime<Utc>,
    },

    /// The engine changed lifecycle state
    EngineStateChanged {
        id: Uuid,
        state: EngineState,
        timestamp: DateTime<Utc>,
    },
}

impl MarketDataEvent {
    pub(crate) fn snapshot_published(entry_count: usize) -> Self {
        MarketDataEvent::SnapshotPublished {
            id: Uuid::new_v4(),
            entry_count,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn refresh_failed(error: FetchError) -> Self {
        MarketDataEvent::RefreshFailed {
            id: Uuid::new_v4(),
            error,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn state_changed(state: EngineState) -> Self {
        MarketDataEvent::EngineStateChanged {
            id: Uuid::new_v4(),
            state,
            timestamp: Utc::now(),
        }
    }

    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            MarketDataEvent::SnapshotPublished { id, .. } => *id,
            MarketDataEvent::RefreshFailed { id, .. } => *id,
            MarketDataEvent::EngineStateChanged { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            MarketDataEvent::SnapshotPublished { .. } => "SNAPSHOT_PUBLISHED",
            MarketDataEvent::RefreshFailed { .. } => "REFRESH_FAILED",
            MarketDataEvent::EngineStateChanged { .. } => "ENGINE_STATE_CHANGED",
        }
    }
}

impl std::fmt::Display for MarketDataEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketDataEvent::SnapshotPublished { entry_count, .. } => {
                write!(f, "Snapshot published with {} entries", entry_count)
            }
            MarketDataEvent::RefreshFailed { error, .. } => {
                write!(f, "Refresh failed: {}", error)
            }
            MarketDataEvent::EngineStateChanged { state, .. } => {
                write!(f, "Engine is now {}", state)
            }
        }
    }
}

/// Overall system health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fresh data from the latest cycle
    Healthy,
    /// Data is available but stale
    Degraded,
    /// No data to show
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}
