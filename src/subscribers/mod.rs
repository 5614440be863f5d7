//! # Event subscribers.
//!
//! ```text
//!   worker / pipeline / timer ── publish(Event) ──► Bus ──► kernel listener
//!                                                               │
//!                                                    SubscriberSet::emit(&Event)
//!                                                               │
//!                                            ┌──────────┬───────┴───┬─────────┐
//!                                            ▼          ▼           ▼         ▼
//!                                        LogWriter   Metrics     Custom      ...
//! ```
//!
//! Implement [`Subscribe`] and pass it to
//! [`KernelBuilder::with_subscribers`](crate::KernelBuilder::with_subscribers).

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
