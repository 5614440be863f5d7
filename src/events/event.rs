//! # Kernel events emitted by workers, pipelines and timers.
//!
//! The [`EventKind`] enum classifies event types across four groups:
//! - **Task events**: a worker loop started, stopped, or contained a faulting item
//! - **Batch events**: progress of a [`process_batch`](crate::Kernel::process_batch) run
//! - **Timer events**: watchdog firings and expired deadlines
//! - **Delivery events**: subscriber overflow and panics
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskline::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ItemFaulted)
//!     .with_task("resize-0")
//!     .with_reason("boom")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::ItemFaulted);
//! assert_eq!(ev.task.as_deref(), Some("resize-0"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of kernel events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// A worker loop started.
    ///
    /// Sets:
    /// - `task`: worker name
    WorkerStarting,

    /// A worker loop observed end-of-stream and exited.
    ///
    /// Sets:
    /// - `task`: worker name
    /// - `count`: items handled successfully
    WorkerStopped,

    /// A handler panicked on one item; the item was dropped and the loop continued.
    ///
    /// Sets:
    /// - `task`: worker, mapper or stage name
    /// - `reason`: panic message
    ItemFaulted,

    // === Batch events ===
    /// A batch pipeline was wired up.
    ///
    /// Sets:
    /// - `task`: batch name
    /// - `count`: number of transform tasks
    BatchStarted,

    /// The batch generator returned; transform inputs are being closed.
    ///
    /// Sets:
    /// - `task`: batch name
    BatchGenerated,

    /// Every tier of the batch has drained.
    ///
    /// Sets:
    /// - `task`: batch name
    /// - `count`: items consumed
    BatchDrained,

    // === Timer events ===
    /// A watchdog interval elapsed without a reset.
    ///
    /// Sets:
    /// - `task`: watchdog name
    /// - `timeout_ms`: watchdog interval
    /// - `count`: firings so far (1-based)
    WatchdogFired,

    /// A watchdog loop exited after `stop`.
    ///
    /// Sets:
    /// - `task`: watchdog name
    /// - `count`: total firings
    WatchdogStopped,

    /// A deadline race was lost by the computation; the fallback was used.
    ///
    /// Sets:
    /// - `timeout_ms`: the limit that expired
    DeadlineExpired,

    /// A grace-bounded shutdown gave up waiting.
    ///
    /// Sets:
    /// - `timeout_ms`: grace
    /// - `count`: tasks still running
    GraceExceeded,

    // === Delivery events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Kernel event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task, batch, watchdog or subscriber, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (panic messages, overflow details).
    pub reason: Option<Arc<str>>,
    /// Interval, limit or grace in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Kind-specific count (items handled, firings, tasks still running).
    pub count: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            timeout_ms: None,
            count: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a count.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// Creates an item-fault event.
    #[inline]
    pub(crate) fn item_faulted(task: &Arc<str>, message: &str) -> Self {
        Event::new(EventKind::ItemFaulted)
            .with_task(Arc::clone(task))
            .with_reason(message)
    }

    /// True for `SubscriberOverflow`; [`SubscriberSet`](crate::SubscriberSet) never
    /// reports an overflow of one of these.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// True when a caller-supplied handler or a subscriber panicked
    /// (`ItemFaulted` or `SubscriberPanicked`).
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ItemFaulted | EventKind::SubscriberPanicked
        )
    }
}
