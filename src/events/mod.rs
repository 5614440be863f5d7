//! Kernel events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: worker and pool loops, `process_batch`, the mapper, the watchdog,
//!   `with_time_limit`, grace-bounded lifecycle calls, `SubscriberSet` workers.
//! - **Consumers**: the kernel listener (fans out to `SubscriberSet`) and any
//!   receiver obtained from [`Kernel::subscribe`](crate::Kernel::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
