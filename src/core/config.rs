//! # Kernel configuration.
//!
//! [`KernelConfig`] holds the few knobs the kernel needs:
//! 1. **Lifecycle**: grace limit for `Kernel::close_and_wait_within` and friends.
//! 2. **Events**: ring size of the broadcast bus.
//! 3. **Queues**: default capacity for `Kernel::queue` and `Kernel::batch_spec`.
//!
//! ## Sentinel values
//! - `grace = 0s` → wait forever (no grace limit)
//! - `bus_capacity = 0` / `queue_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::queue::Capacity;

/// Global configuration for a [`Kernel`](crate::Kernel).
///
/// All fields are public. Prefer the helper accessors over checking the
/// sentinels directly.
#[derive(Clone, Debug)]
pub struct KernelConfig {
    /// Maximum time the `*_within` lifecycle calls wait for tasks to exit.
    ///
    /// - `Duration::ZERO` = wait forever
    /// - `> 0` = give up with `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Capacity of the event bus ring buffer.
    ///
    /// Receivers lagging more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,

    /// Default capacity of queues created through the kernel.
    pub queue_capacity: usize,
}

impl KernelConfig {
    /// Returns the grace limit as an `Option` (`None` = wait forever).
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the default queue capacity (minimum 1).
    #[inline]
    pub fn default_capacity(&self) -> Capacity {
        Capacity::Bounded(self.queue_capacity.max(1))
    }
}

impl Default for KernelConfig {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `queue_capacity = 64`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            queue_capacity: 64,
        }
    }
}
