//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for observing kernel events.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (a kernel worker loop)
//! - **Own bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are contained and published as `EventKind::SubscriberPanicked`)
//!
//! ## Rules
//! - A slow subscriber only fills its own queue.
//! - Queue overflow drops the event **for this subscriber only** and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers also receive `SubscriberPanicked` events. A panic while handling
//!   one of those is logged but not published again.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use taskline::{Event, EventKind, Subscribe};
//!
//! struct FaultCounter;
//!
//! #[async_trait]
//! impl Subscribe for FaultCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::ItemFaulted) {
//!             // bump a metric, page someone, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "fault-counter" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for kernel observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from the subscriber's own worker task, never in the publisher context.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity for this subscriber (clamped to at least 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
