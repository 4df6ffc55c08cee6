//! Broadcast hub: fan-out of radio events to live subscribers
//!
//! Each subscriber owns a bounded queue. Delivery to one subscriber never
//! waits on another: a subscriber whose queue is closed (disconnected) or
//! full (stalled) is removed on the spot and the fan-out continues. A
//! removed subscriber's transport ends, and the client reconnects to a fresh
//! catch-up snapshot, so no live subscriber ever silently misses an event.
//!
//! Ordering: the scheduler only broadcasts while holding its state lock, and
//! each queue is FIFO, so every subscriber sees events in generation order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;
use wrad_common::RadioEvent;

/// Opaque subscriber handle
pub type SubscriberId = Uuid;

type Registry = Mutex<HashMap<SubscriberId, mpsc::Sender<Arc<RadioEvent>>>>;

/// Per-subscriber delivery result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Queue closed or full; the subscriber has been removed
    Dropped,
}

/// Summary of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Registry of live subscribers
#[derive(Clone)]
pub struct BroadcastHub {
    registry: Arc<Registry>,
    buffer: usize,
}

impl BroadcastHub {
    /// Create a hub
    ///
    /// # Arguments
    ///
    /// * `buffer` - Events queued per subscriber before it is considered stalled (min 2)
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            buffer: buffer.max(2),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<Arc<RadioEvent>>>> {
        // The map stays consistent even if a holder panicked mid-iteration
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber
    ///
    /// Queues the `connected` frame followed by `catch_up` (if any) before the
    /// subscriber becomes visible to `broadcast`, so these always come first.
    pub fn subscribe(&self, catch_up: Option<RadioEvent>) -> Subscription {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.buffer);

        // Fresh queue with capacity >= 2: both sends succeed
        let _ = tx.try_send(Arc::new(RadioEvent::Connected));
        if let Some(event) = catch_up {
            let _ = tx.try_send(Arc::new(event));
        }

        let count = {
            let mut registry = self.lock();
            registry.insert(id, tx);
            registry.len()
        };
        info!("Listener {} subscribed, total listeners: {}", id, count);

        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            info!("Listener {} unsubscribed", id);
        }
        removed
    }

    /// Deliver an event to every subscriber
    pub fn broadcast(&self, event: RadioEvent) -> BroadcastReport {
        let event = Arc::new(event);
        let mut report = BroadcastReport::default();
        let mut registry = self.lock();

        registry.retain(|id, tx| match deliver(tx, &event) {
            Delivery::Delivered => {
                report.delivered += 1;
                true
            }
            Delivery::Dropped => {
                warn!(
                    "Dropping listener {} ({} undeliverable)",
                    id,
                    event.kind()
                );
                report.dropped += 1;
                false
            }
        });

        debug!(
            "Broadcast {} to {} listeners ({} dropped)",
            event.kind(),
            report.delivered,
            report.dropped
        );
        report
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }
}

fn deliver(tx: &mpsc::Sender<Arc<RadioEvent>>, event: &Arc<RadioEvent>) -> Delivery {
    match tx.try_send(Arc::clone(event)) {
        Ok(()) => Delivery::Delivered,
        Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => Delivery::Dropped,
    }
}

/// One live subscriber's end of the hub
///
/// Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<RadioEvent>>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event; `None` once the hub has dropped this subscriber and the
    /// queue is drained
    pub async fn recv(&mut self) -> Option<Arc<RadioEvent>> {
        self.rx.recv().await
    }

    /// Next already-queued event, without waiting
    pub fn try_recv(&mut self) -> Option<Arc<RadioEvent>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let removed = registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id)
                .is_some();
            if removed {
                debug!("Listener {} disconnected", self.id);
            }
        }
    }
}
