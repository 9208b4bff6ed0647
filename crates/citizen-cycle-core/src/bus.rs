//! Fan-out of [`CycleEvent`] signals.
//!
//! A single `tokio::sync::broadcast` channel carries every signal kind.
//! Each subscriber gets its own receiver; publishing never waits on
//! subscribers. A subscriber that falls more than [`BUS_CAPACITY`]
//! messages behind receives `Lagged` and skips ahead.

use citizen_cycle_types::CycleEvent;
use tokio::sync::broadcast;

/// Capacity of the signal channel.
pub const BUS_CAPACITY: usize = 256;

/// Cloneable handle for publishing and subscribing to signals.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CycleEvent>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Subscribe to all future signals.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.tx.subscribe()
    }

    /// Publish a signal to every current subscriber.
    ///
    /// Returns the number of subscribers reached; 0 is not an error.
    pub fn publish(&self, event: CycleEvent) -> usize {
        // send fails only when nobody is subscribed.
        self.tx.send(event).unwrap_or(0)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
