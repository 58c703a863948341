//! Subscriber fan-out.
//!
//! Every published snapshot is offered to each registered sink without
//! blocking. A sink that is closed or whose buffer is full is unregistered
//! after the pass; the remaining subscribers are unaffected.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use blotter_core::PortfolioSnapshot;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

// =============================================================================
// Types
// =============================================================================

/// Identifies a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Why a snapshot could not be handed to a subscriber.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving side has gone away.
    #[error("subscriber closed")]
    Closed,
    /// The subscriber's buffer is full.
    #[error("subscriber lagging: buffer full")]
    Lagging,
}

/// A consumer of published snapshots.
///
/// `deliver` is called from the publishing path and must not block.
pub trait SnapshotSink: Send + Sync {
    /// Hands over one snapshot.
    fn deliver(&self, snapshot: &Arc<PortfolioSnapshot>) -> Result<(), DeliveryError>;
}

impl SnapshotSink for mpsc::Sender<Arc<PortfolioSnapshot>> {
    fn deliver(&self, snapshot: &Arc<PortfolioSnapshot>) -> Result<(), DeliveryError> {
        self.try_send(Arc::clone(snapshot)).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Lagging,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

/// Outcome of one notification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Subscribers that accepted the snapshot
    pub delivered: usize,
    /// Subscribers removed because delivery failed
    pub dropped: Vec<(SubscriberId, DeliveryError)>,
}

// =============================================================================
// Registry
// =============================================================================

/// Set of live subscribers.
pub struct SubscriberRegistry {
    sinks: DashMap<SubscriberId, Arc<dyn SnapshotSink>>,
    next_id: AtomicU64,
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.sinks.len())
            .finish()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sinks: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates an unused subscriber id.
    pub fn next_id(&self) -> SubscriberId {
        SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers `sink` under `id`.
    ///
    /// Returns `false` and leaves the existing sink in place when `id` is
    /// already registered.
    pub fn register(&self, id: SubscriberId, sink: Arc<dyn SnapshotSink>) -> bool {
        match self.sinks.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(sink);
                debug!("Registered subscriber {}", id);
                true
            }
        }
    }

    /// Removes `id`. Returns `false` when it was not registered.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.sinks.remove(&id).is_some();
        if removed {
            debug!("Unregistered subscriber {}", id);
        }
        removed
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.sinks.contains_key(&id)
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// True when nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Creates a channel-backed subscription holding up to `capacity`
    /// undelivered snapshots.
    pub fn subscribe(&self, capacity: usize) -> Subscription {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = self.next_id();
        self.register(id, Arc::new(tx));
        Subscription {
            id,
            rx,
            last_sequence: 0,
        }
    }

    /// Offers `snapshot` to every subscriber.
    ///
    /// Sinks are collected before delivery so no map shard is locked while
    /// a sink runs; registrations made during the pass may or may not see
    /// this snapshot.
    pub fn notify(&self, snapshot: &Arc<PortfolioSnapshot>) -> NotifyReport {
        let sinks: Vec<(SubscriberId, Arc<dyn SnapshotSink>)> = self
            .sinks
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut report = NotifyReport::default();
        for (id, sink) in sinks {
            match sink.deliver(snapshot) {
                Ok(()) => report.delivered += 1,
                Err(e) => report.dropped.push((id, e)),
            }
        }

        for (id, reason) in &report.dropped {
            if self.sinks.remove(id).is_some() {
                warn!(
                    "Dropping subscriber {} at sequence {}: {}",
                    id, snapshot.sequence, reason
                );
            }
        }

        report
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Receiving side of a channel subscription.
///
/// Yields snapshots in strictly increasing sequence order; anything at or
/// below the last delivered sequence is skipped.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<PortfolioSnapshot>>,
    last_sequence: u64,
}

impl Subscription {
    /// Registry id of this subscription.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Sequence of the last snapshot handed out, 0 before the first.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Marks `sequence` as already seen, e.g. after sending the current
    /// snapshot to a newly connected client.
    pub fn skip_through(&mut self, sequence: u64) {
        self.last_sequence = self.last_sequence.max(sequence);
    }

    /// Waits for the next snapshot. `None` once the subscription has been
    /// dropped from the registry and drained.
    pub async fn recv(&mut self) -> Option<Arc<PortfolioSnapshot>> {
        loop {
            let snapshot = self.rx.recv().await?;
            if let Some(s) = self.accept(snapshot) {
                return Some(s);
            }
        }
    }

    /// Next buffered snapshot without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<PortfolioSnapshot>> {
        while let Ok(snapshot) = self.rx.try_recv() {
            if let Some(s) = self.accept(snapshot) {
                return Some(s);
            }
        }
        None
    }

    fn accept(&mut self, snapshot: Arc<PortfolioSnapshot>) -> Option<Arc<PortfolioSnapshot>> {
        if snapshot.sequence > self.last_sequence {
            self.last_sequence = snapshot.sequence;
            Some(snapshot)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blotter_core::CurveParameters;
    use parking_lot::Mutex;

    fn snapshot(sequence: u64) -> Arc<PortfolioSnapshot> {
        let mut s =
            PortfolioSnapshot::new(CurveParameters::default(), Vec::new(), Vec::new(), 0.0);
        s.sequence = sequence;
        Arc::new(s)
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<u64>>);

    impl SnapshotSink for Recording {
        fn deliver(&self, snapshot: &Arc<PortfolioSnapshot>) -> Result<(), DeliveryError> {
            self.0.lock().push(snapshot.sequence);
            Ok(())
        }
    }

    struct Failing;

    impl SnapshotSink for Failing {
        fn deliver(&self, _: &Arc<PortfolioSnapshot>) -> Result<(), DeliveryError> {
            Err(DeliveryError::Closed)
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let id = registry.next_id();
        let sink = Arc::new(Recording::default());

        assert!(registry.register(id, sink.clone()));
        assert!(!registry.register(id, sink));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let id = registry.next_id();
        registry.register(id, Arc::new(Recording::default()));

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(!registry.unregister(SubscriberId(999)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_all_subscribers_receive_same_snapshot() {
        let registry = SubscriberRegistry::new();
        let a = Arc::new(Recording::default());
        let b = Arc::new(Recording::default());
        registry.register(registry.next_id(), a.clone());
        registry.register(registry.next_id(), b.clone());

        let report = registry.notify(&snapshot(7));

        assert_eq!(report.delivered, 2);
        assert_eq!(*a.0.lock(), vec![7]);
        assert_eq!(*b.0.lock(), vec![7]);
    }

    #[test]
    fn test_failing_subscriber_removed_others_unaffected() {
        let registry = SubscriberRegistry::new();
        let good = Arc::new(Recording::default());
        let good_id = registry.next_id();
        let bad_id = registry.next_id();
        registry.register(good_id, good.clone());
        registry.register(bad_id, Arc::new(Failing));

        let report = registry.notify(&snapshot(1));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, vec![(bad_id, DeliveryError::Closed)]);
        assert!(!registry.contains(bad_id));
        assert!(registry.contains(good_id));

        registry.notify(&snapshot(2));
        assert_eq!(*good.0.lock(), vec![1, 2]);
    }

    #[test]
    fn test_full_channel_is_lagging() {
        let registry = SubscriberRegistry::new();
        let sub = registry.subscribe(1);

        assert_eq!(registry.notify(&snapshot(1)).delivered, 1);
        let report = registry.notify(&snapshot(2));

        assert_eq!(report.dropped, vec![(sub.id(), DeliveryError::Lagging)]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropped_subscription_is_closed() {
        let registry = SubscriberRegistry::new();
        let sub = registry.subscribe(4);
        let id = sub.id();
        drop(sub);

        let report = registry.notify(&snapshot(1));
        assert_eq!(report.dropped, vec![(id, DeliveryError::Closed)]);
    }

    #[test]
    fn test_subscription_skips_stale_sequences() {
        let registry = SubscriberRegistry::new();
        let mut sub = registry.subscribe(8);

        registry.notify(&snapshot(3));
        registry.notify(&snapshot(2));
        registry.notify(&snapshot(3));
        registry.notify(&snapshot(5));

        assert_eq!(sub.try_recv().map(|s| s.sequence), Some(3));
        assert_eq!(sub.try_recv().map(|s| s.sequence), Some(5));
        assert!(sub.try_recv().is_none());
        assert_eq!(sub.last_sequence(), 5);
    }

    #[test]
    fn test_skip_through() {
        let registry = SubscriberRegistry::new();
        let mut sub = registry.subscribe(8);
        assert_eq!(sub.last_sequence(), 0);
        sub.skip_through(4);
        sub.skip_through(2);
        assert_eq!(sub.last_sequence(), 4);

        registry.notify(&snapshot(4));
        registry.notify(&snapshot(5));

        assert_eq!(sub.try_recv().map(|s| s.sequence), Some(5));
    }

    #[tokio::test]
    async fn test_recv_waits_for_publish() {
        let registry = Arc::new(SubscriberRegistry::new());
        let mut sub = registry.subscribe(4);

        let publisher = Arc::clone(&registry);
        tokio::spawn(async move {
            publisher.notify(&snapshot(1));
        });

        let received = sub.recv().await.unwrap();
        assert_eq!(received.sequence, 1);
    }
}
