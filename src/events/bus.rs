//! # Event bus for broadcasting kernel events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] shared by every
//! worker, pipeline and timer the [`Kernel`](crate::Kernel) starts.
//!
//! ```text
//!   worker-0 ──┐
//!   worker-1 ──┼──► Bus ──► kernel listener ──► SubscriberSet
//!   watchdog ──┤       └──► Kernel::subscribe() receivers
//!   deadline ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never suspends the publishing task.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if nobody is subscribed at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for kernel events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
