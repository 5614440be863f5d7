use std::sync::Arc;

use crate::{
    core::KernelConfig,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

use super::kernel::Kernel;

/// Builder for constructing a [`Kernel`] with optional subscribers.
pub struct KernelBuilder {
    cfg: KernelConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl KernelBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: KernelConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive kernel events (worker lifecycle, faults, timers)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the kernel.
    ///
    /// With subscribers configured this spawns the bus listener, so it must be
    /// called inside a Tokio runtime.
    pub fn build(self) -> Kernel {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = if self.subscribers.is_empty() {
            None
        } else {
            Some(SubscriberSet::new(self.subscribers, bus.clone()))
        };
        Kernel::new_internal(self.cfg, bus, subs)
    }
}
