//! Cross-context change notifier.
//!
//! Propagates local mutations to other execution contexts (sibling views,
//! windows) sharing the same store, so they can re-read and re-render
//! without shared in-process state. This is an explicit publish/subscribe
//! channel injected into the facade, which keeps it independent of any host
//! broadcasting primitive and substitutable in tests.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// A storage-change notification scoped to one collection key.
///
/// `new_value`/`old_value` hold the raw persisted JSON, `None` meaning the
/// key was absent on that side of the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub old_value: Option<String>,
}

/// Sender half held per subscriber.
pub type EventSender = mpsc::UnboundedSender<StorageEvent>;

/// A live subscription to storage-change notifications.
#[derive(Debug)]
pub struct Subscription {
    /// Identifier used to unsubscribe
    pub id: Uuid,
    /// Channel delivering events in broadcast order
    pub receiver: mpsc::UnboundedReceiver<StorageEvent>,
}

/// Registry of storage-change subscribers.
///
/// Thread-safe and shared across the facade and feature code via `Arc`.
/// Delivery is fire-and-forget: no acknowledgment, and no ordering
/// guarantee across contexts beyond the channel's native delivery order.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscribers: DashMap<Uuid, EventSender>,
}

impl ChangeNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Create a notifier wrapped in `Arc` for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();

        self.subscribers.insert(id, sender);
        tracing::debug!(subscriber = %id, "storage-change subscriber registered");

        Subscription { id, receiver }
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, id: &Uuid) {
        if self.subscribers.remove(id).is_some() {
            tracing::debug!(subscriber = %id, "storage-change subscriber unregistered");
        }
    }

    /// Broadcast a storage-change event to all live subscribers.
    ///
    /// Returns the number of subscribers reached. Subscribers whose
    /// receiver has been dropped are pruned.
    pub fn broadcast(&self, event: StorageEvent) -> usize {
        let mut sent_count = 0;
        let mut closed = Vec::new();

        for entry in self.subscribers.iter() {
            if entry.value().send(event.clone()).is_ok() {
                sent_count += 1;
            } else {
                closed.push(*entry.key());
            }
        }

        for id in closed {
            self.subscribers.remove(&id);
        }

        tracing::debug!(
            key = %event.key,
            recipients = sent_count,
            "broadcast storage change"
        );

        sent_count
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
