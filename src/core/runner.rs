//! # Contained execution of caller-supplied code.
//!
//! Every per-item invocation in the kernel goes through [`run_contained`]: the
//! future is polled inside `catch_unwind`, so a panic becomes a [`Fault`] value
//! instead of killing the task that runs the loop.
//!
//! ```text
//!   handler(item) ──► catch_unwind ──► Ok(value)
//!                                └──► Err(Fault) ──► report(): tracing::warn + ItemFaulted
//! ```
//!
//! **Warning**: `AssertUnwindSafe` is used. A handler that panics while holding a
//! lock on shared state can leave that state inconsistent; the kernel only
//! guarantees that the *loop* survives.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::warn;

use crate::error::Fault;
use crate::events::{Bus, Event};

/// Polls `fut` to completion, converting a panic into a [`Fault`].
///
/// Build the future lazily (`async { f(x).await }`) so a panic in the synchronous
/// part of `f` is contained too.
pub(crate) async fn run_contained<F: Future>(fut: F) -> Result<F::Output, Fault> {
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(Fault::from_panic)
}

/// Runs a synchronous callback, converting a panic into a [`Fault`].
pub(crate) fn call_contained<R>(f: impl FnOnce() -> R) -> Result<R, Fault> {
    std::panic::catch_unwind(AssertUnwindSafe(f)).map_err(Fault::from_panic)
}

/// Logs a contained fault and publishes `ItemFaulted`.
pub(crate) fn report(bus: &Bus, task: &Arc<str>, fault: &Fault) {
    warn!(task = %task, error = %fault, "work item faulted; continuing");
    bus.publish(Event::item_faulted(task, fault.message()));
}
