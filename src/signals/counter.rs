//! # Running-task counter.
//!
//! Tracks how many tasks of a pool are still running. Every task holds a
//! [`CounterGuard`]; dropping it decrements the count, and the last drop wakes
//! all waiters.
//!
//! ## Rules
//! - All guards are taken **before** the pool is handed to the caller, so the count
//!   cannot touch zero early and re-rise.
//! - The count reaches zero if and only if every task has exited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    running: AtomicUsize,
    zero: Notify,
}

/// Number of still-running tasks in a pool, with a wait-for-zero.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    inner: Arc<Inner>,
}

impl Counter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers one more running task.
    pub(crate) fn enter(&self) -> CounterGuard {
        self.inner.running.fetch_add(1, Ordering::AcqRel);
        CounterGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Current number of running tasks.
    pub fn running(&self) -> usize {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Waits until every task has exited.
    pub async fn wait(&self) {
        loop {
            let zero = self.inner.zero.notified();
            tokio::pin!(zero);
            zero.as_mut().enable();

            if self.running() == 0 {
                return;
            }
            zero.await;
        }
    }
}

/// Held by a running task; decrements the [`Counter`] on drop.
pub(crate) struct CounterGuard {
    inner: Arc<Inner>,
}

impl Drop for CounterGuard {
    fn drop(&mut self) {
        if self.inner.running.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.zero.notify_waiters();
        }
    }
}
