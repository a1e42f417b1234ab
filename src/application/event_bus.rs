//! Publish/subscribe fan-out for whitelist events.
//!
//! Delivery is at-least-once with no replay: a subscriber registered
//! after an event fired never sees it and must query current predicate
//! state instead. Events from one publisher reach a given subscriber in
//! emission order; there is no ordering across publishers.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{RepositoryId, WhitelistEvent};

struct SubscriberEntry {
    /// `None` subscribes to every publisher.
    filter: Option<HashSet<RepositoryId>>,
    tx: mpsc::UnboundedSender<WhitelistEvent>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: HashMap<u64, SubscriberEntry>,
}

/// Broadcast channel registry for `WhitelistEvent`s.
#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to events from every publisher.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        self.register(None)
    }

    /// Subscribes to events from the given publisher ids only.
    pub fn subscribe_filtered(
        self: &Arc<Self>,
        ids: impl IntoIterator<Item = RepositoryId>,
    ) -> Subscription {
        self.register(Some(ids.into_iter().collect()))
    }

    fn register(self: &Arc<Self>, filter: Option<HashSet<RepositoryId>>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().expect("event bus lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, SubscriberEntry { filter, tx });

        Subscription {
            id,
            bus: Arc::clone(self),
            rx,
        }
    }

    /// Delivers `event` to every matching live subscriber. Subscribers
    /// whose receiving side is gone are dropped from the registry.
    pub fn publish(&self, event: &WhitelistEvent) {
        let mut inner = self.inner.lock().expect("event bus lock poisoned");

        inner.subscribers.retain(|_, entry| {
            let wanted = entry
                .filter
                .as_ref()
                .map_or(true, |ids| ids.contains(event.repository_id()));
            if !wanted {
                return true;
            }
            entry.tx.send(event.clone()).is_ok()
        });

        debug!(
            repository = %event.repository_id(),
            published = event.is_published(),
            subscribers = inner.subscribers.len(),
            "Delivered whitelist event"
        );
    }

    fn unregister(&self, id: u64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscribers.remove(&id);
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.inner.lock().expect("event bus lock poisoned").subscribers.len()
    }
}

/// Handle to a registered subscriber. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    bus: Arc<EventBus>,
    rx: mpsc::UnboundedReceiver<WhitelistEvent>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<WhitelistEvent> {
        self.rx.recv().await
    }

    /// Non-blocking drain of everything delivered so far.
    pub fn drain(&mut self) -> Vec<WhitelistEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unregister(self.id);
    }
}
