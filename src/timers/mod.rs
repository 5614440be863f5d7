//! # Standalone timing utilities.
//!
//! - [`Watchdog`] + [`Resetter`]: fires a handler unless reset within an interval
//! - `with_time_limit`: races a computation against a deadline
//!
//! Both are leaves: they use queues and signals but no worker machinery.

pub(crate) mod deadline;
pub(crate) mod watchdog;

pub use watchdog::{Resetter, Watchdog};
