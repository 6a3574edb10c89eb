//! Publish/subscribe bus for burst events.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::burst::LrBurst;

/// Receiver of burst notifications.
pub trait BurstSubscriber: Send + Sync {
    /// Called synchronously for every published burst.
    fn on_burst(&self, burst: &LrBurst);
}

/// Synchronous publish/subscribe bus.
///
/// Publishing invokes every subscriber inline on the publisher's thread;
/// there is no queuing at this layer. The hippocampus-side novelty
/// detector is the expected producer, the learning-rate modulator the
/// in-core consumer.
#[derive(Default)]
pub struct SensitivityEventBus {
    subscribers: RwLock<Vec<Arc<dyn BurstSubscriber>>>,
}

impl SensitivityEventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn BurstSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Publish a burst to every subscriber, synchronously.
    pub fn publish(&self, burst: &LrBurst) {
        let subscribers = self.subscribers.read();
        debug!(
            tags = ?burst.tags,
            amplification = burst.initial_amplification,
            subscribers = subscribers.len(),
            "publishing sensitivity burst"
        );
        for subscriber in subscribers.iter() {
            subscriber.on_burst(burst);
        }
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl std::fmt::Debug for SensitivityEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitivityEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
