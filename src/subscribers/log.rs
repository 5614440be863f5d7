//! # LogWriter: kernel events as `tracing` records.
//!
//! Enabled with the `logging` feature. Faults, overflows and expired grace
//! periods are logged at `warn`, everything else at `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG taskline: worker starting task=resize-0
//!  WARN taskline: item faulted task=resize-0 reason="boom"
//! DEBUG taskline: watchdog fired task=heartbeat interval_ms=500 fired=1
//! DEBUG taskline: batch drained task=thumbnails consumed=18
//!  WARN taskline: grace exceeded grace_ms=30000 running=2
//! ```

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::WorkerStarting => debug!(target: "taskline", task, "worker starting"),
            EventKind::WorkerStopped => {
                debug!(target: "taskline", task, handled = e.count, "worker stopped");
            }
            EventKind::ItemFaulted => warn!(target: "taskline", task, reason, "item faulted"),
            EventKind::BatchStarted => {
                debug!(target: "taskline", task, transformers = e.count, "batch started");
            }
            EventKind::BatchGenerated => debug!(target: "taskline", task, "batch generated"),
            EventKind::BatchDrained => {
                debug!(target: "taskline", task, consumed = e.count, "batch drained");
            }
            EventKind::WatchdogFired => debug!(
                target: "taskline",
                task,
                interval_ms = e.timeout_ms,
                fired = e.count,
                "watchdog fired"
            ),
            EventKind::WatchdogStopped => {
                debug!(target: "taskline", task, fired = e.count, "watchdog stopped");
            }
            EventKind::DeadlineExpired => {
                debug!(target: "taskline", limit_ms = e.timeout_ms, "deadline expired");
            }
            EventKind::GraceExceeded => warn!(
                target: "taskline",
                grace_ms = e.timeout_ms,
                running = e.count,
                "grace exceeded"
            ),
            EventKind::SubscriberPanicked => {
                warn!(target: "taskline", subscriber = task, reason, "subscriber panicked");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "taskline", subscriber = task, reason, "subscriber overflow");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
