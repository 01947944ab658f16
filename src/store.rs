//! In-memory snapshot store with broadcast capabilities

use crate::{
    constants::EVENT_CHANNEL_CAPACITY,
    error::FetchError,
    types::{MarketDataEvent, RankedEntry, Snapshot},
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Holder of the single current snapshot
///
/// The current snapshot lives behind a tokio watch channel as an `Arc`. Every
/// publish swaps in a whole new `Arc<Snapshot>`, so a reader holding an older
/// `Arc` keeps a consistent view and never observes a half-built one.
pub struct SnapshotStore {
    current: watch::Sender<Arc<Snapshot>>,
    events: broadcast::Sender<MarketDataEvent>,
}

impl SnapshotStore {
    /// Creates a store holding an empty `ok` snapshot stamped now
    pub fn new() -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::empty(Utc::now())));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { current, events }
    }

    /// Returns the latest published snapshot without waiting
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// Subscribes to snapshot replacements
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }

    /// Subscribes to market data events
    pub fn subscribe_events(&self) -> broadcast::Receiver<MarketDataEvent> {
        self.events.subscribe()
    }

    /// Replaces the current snapshot with a fresh one built from `entries`
    pub fn publish(&self, entries: Vec<RankedEntry>) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot::ok(entries, Utc::now()));
        self.current.send_replace(snapshot.clone());

        tracing::debug!(
            entries = snapshot.len(),
            produced_at = %snapshot.produced_at,
            "Published market snapshot"
        );
        self.emit(MarketDataEvent::snapshot_published(snapshot.len()));

        snapshot
    }

    /// Replaces the current snapshot with a stale copy recording `cause`
    pub fn mark_stale(&self, cause: FetchError) -> Arc<Snapshot> {
        let stale = Arc::new(self.current().mark_stale(cause.clone(), Utc::now()));
        self.current.send_replace(stale.clone());

        self.emit(MarketDataEvent::refresh_failed(cause));

        stale
    }

    /// Re-stamps the initial empty snapshot with the current time
    ///
    /// Called when the engine starts so the empty snapshot carries the start
    /// time. Does nothing once a cycle has published.
    pub(crate) fn restamp_initial(&self) {
        self.current.send_if_modified(|current| {
            if current.is_empty() && !current.is_stale() {
                *current = Arc::new(Snapshot::empty(Utc::now()));
                true
            } else {
                false
            }
        });
    }

    /// Sends an event to all event subscribers
    pub(crate) fn emit(&self, event: MarketDataEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SnapshotStatus;

    fn entry(rank: u32, symbol: &str) -> RankedEntry {
        RankedEntry {
            rank,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price: 1.0,
            change_percent: 0.0,
        }
    }

    #[test]
    fn test_new_store_is_empty_ok() {
        let store = SnapshotStore::new();
        let snapshot = store.current();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.status, SnapshotStatus::Ok);
    }

    #[test]
    fn test_publish_replaces_without_touching_old_reference() {
        let store = SnapshotStore::new();
        let before = store.current();

        store.publish(vec![entry(1, "BTC"), entry(2, "ETH")]);

        assert!(before.is_empty());
        assert_eq!(store.current().len(), 2);
    }

    #[test]
    fn test_mark_stale_keeps_entries() {
        let store = SnapshotStore::new();
        let published = store.publish(vec![entry(1, "BTC")]);

        let stale = store.mark_stale(FetchError::Network("connection reset".to_string()));

        assert_eq!(stale.entries, published.entries);
        assert_eq!(stale.status, SnapshotStatus::StaleAfterError);
        assert_eq!(store.current(), stale);
        assert_eq!(published.status, SnapshotStatus::Ok);
    }

    #[test]
    fn test_restamp_initial_moves_timestamp_forward() {
        let store = SnapshotStore::new();
        let created = store.current();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let before_restamp = Utc::now();
        store.restamp_initial();

        let restamped = store.current();
        assert!(restamped.is_empty());
        assert_eq!(restamped.status, SnapshotStatus::Ok);
        assert!(restamped.produced_at >= before_restamp);
        assert!(restamped.produced_at > created.produced_at);
    }

    #[test]
    fn test_restamp_initial_leaves_published_data() {
        let store = SnapshotStore::new();
        let published = store.publish(vec![entry(1, "BTC")]);

        store.restamp_initial();

        assert_eq!(store.current(), published);
    }

    #[tokio::test]
    async fn test_subscribers_see_publish() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();
        let mut events = store.subscribe_events();

        store.publish(vec![entry(1, "BTC")]);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type(), "SNAPSHOT_PUBLISHED");
    }

    #[tokio::test]
    async fn test_mark_stale_emits_refresh_failed() {
        let store = SnapshotStore::new();
        let mut events = store.subscribe_events();

        store.mark_stale(FetchError::EmptyResult);

        match events.recv().await.unwrap() {
            MarketDataEvent::RefreshFailed { error, .. } => {
                assert_eq!(error, FetchError::EmptyResult)
            }
            other => panic!("unexpected event: {other}"),
        }
    }
}
