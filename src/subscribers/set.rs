//! # Non-blocking event fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] hands each [`Event`] to every subscriber **without awaiting**
//! their processing. Each subscriber is driven by an ordinary kernel worker:
//!
//! ```text
//! emit(event)
//!     │                      (Arc-clone per subscriber)
//!     ├──► try_send ─► [queue 1] ─► worker 1 ─► on_event()
//!     │       └─ Full/Closed ─► SubscriberOverflow     └─ panic ─► SubscriberPanicked
//!     ├──► try_send ─► [queue 2] ─► worker 2 ─► on_event()
//!     └──► try_send ─► [queue N] ─► worker N ─► on_event()
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may handle event N while B handles N+5.
//! - **No overflow-on-overflow**: an overflow event that itself overflows is dropped silently.
//! - **No panic-on-panic**: a panic while handling `SubscriberPanicked` is logged only,
//!   so a subscriber that panics on everything cannot feed itself.
//! - **Shutdown**: closes every queue, then waits for the workers to drain them.

use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use super::Subscribe;
use crate::core::runner::run_contained;
use crate::events::{Bus, Event, EventKind};
use crate::queue::{queue, Capacity, Producer, TrySendError};
use crate::signals::{completion, Done};

struct Lane {
    name: &'static str,
    input: Producer<Arc<Event>>,
    done: Done,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| Self::spawn_lane(sub, bus.clone()))
            .collect();
        Self { lanes, bus }
    }

    fn spawn_lane(sub: Arc<dyn Subscribe>, bus: Bus) -> Lane {
        let name = sub.name();
        let capacity = Capacity::Bounded(sub.queue_capacity().max(1));
        let (input, mut rx) = queue::<Arc<Event>>(capacity);
        let (signal, done) = completion();

        tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                if let Err(fault) = run_contained(sub.on_event(ev.as_ref())).await {
                    warn!(subscriber = name, error = %fault, "subscriber panicked");
                    if ev.kind != EventKind::SubscriberPanicked {
                        bus.publish(Event::subscriber_panicked(name, fault.message().to_string()));
                    }
                }
            }
            signal.complete();
        });

        Lane { name, input, done }
    }

    /// Fans one event out to all subscribers (non-blocking).
    pub fn emit(&self, event: &Event) {
        let is_overflow_evt = event.is_subscriber_overflow();
        let ev = Arc::new(event.clone());

        for lane in &self.lanes {
            let reason = match lane.input.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) | Err(TrySendError::Disconnected(_)) => "closed",
            };
            if !is_overflow_evt {
                self.bus.publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Graceful shutdown: close all queues and wait for every worker to drain.
    pub async fn shutdown(self) {
        let waits = self.lanes.into_iter().map(|lane| {
            lane.input.close();
            let mut done = lane.done;
            async move { done.wait().await }
        });
        join_all(waits).await;
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}
