//! # Batch pipeline: generate ─► transform (fan-out) ─► consume (fan-in).
//!
//! ```text
//!                        ┌──► [in 0] ─► transform-0 ──┐
//!   generate(senders) ───┼──► [in 1] ─► transform-1 ──┼──► [results] ─► consume
//!   (caller routes)      └──► [in N] ─► transform-N ──┘    (one task)
//! ```
//!
//! ## Shutdown order
//! 1. `generate` returns.
//! 2. All transform inputs are closed; wait for the transform [`Counter`](crate::Counter) to reach zero.
//! 3. Only then is the results queue closed and the consume task awaited.
//!
//! Closing `results` earlier would tell the consumer "no more input" while
//! transform tasks still forward their last items.
//!
//! ## Ordering
//! Results from one transform task reach the consumer in that task's order;
//! across transform tasks there is no ordering.
//!
//! ## Faults
//! `transform` and `consume` run contained: a panicking item is dropped and
//! reported, the stage keeps going. A panicking `generate` is contained as well:
//! whatever it already routed is drained, then the fault is returned.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::core::lifecycle::{close_all_and_wait, close_and_wait};
use crate::core::runner::{report, run_contained};
use crate::error::Fault;
use crate::events::{Bus, Event, EventKind};
use crate::queue::{Capacity, Producer, Sender};
use crate::tasks::worker::{spawn_pool, spawn_worker};

/// Shape of a batch pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchSpec {
    /// Number of transform tasks (fan-out width). `0` is treated as `1`.
    pub transformers: usize,
    /// Capacity of each transform task's input queue.
    pub transform_capacity: Capacity,
    /// Capacity of the single consume task's input queue.
    pub consume_capacity: Capacity,
}

impl BatchSpec {
    /// Creates a spec with `transformers` tasks and explicit queue capacities.
    pub fn new(
        transformers: usize,
        transform_capacity: impl Into<Capacity>,
        consume_capacity: impl Into<Capacity>,
    ) -> Self {
        Self {
            transformers,
            transform_capacity: transform_capacity.into(),
            consume_capacity: consume_capacity.into(),
        }
    }
}

impl Default for BatchSpec {
    /// Four transformers, 64-item queues on both tiers.
    fn default() -> Self {
        Self::new(4, Capacity::Bounded(64), Capacity::Bounded(64))
    }
}

/// Counts reported by a drained batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Items that passed `transform` and were forwarded to the consumer.
    pub transformed: u64,
    /// Items that `consume` completed.
    pub consumed: u64,
}

#[derive(Default)]
struct Tally {
    transformed: AtomicU64,
    consumed: AtomicU64,
}

/// Wires and drains one batch.
pub(crate) async fn process_batch<T, R, G, GFut, X, XFut, C, CFut>(
    bus: Bus,
    name: &str,
    spec: BatchSpec,
    generate: G,
    transform: X,
    consume: C,
) -> Result<BatchReport, Fault>
where
    T: Send + 'static,
    R: Send + 'static,
    G: FnOnce(Vec<Sender<T>>) -> GFut,
    GFut: Future<Output = ()>,
    X: Fn(T) -> XFut + Send + Sync + 'static,
    XFut: Future<Output = R> + Send + 'static,
    C: Fn(R) -> CFut + Send + Sync + 'static,
    CFut: Future<Output = ()> + Send + 'static,
{
    let batch: Arc<str> = Arc::from(name);
    let width = spec.transformers.max(1);
    let tally = Arc::new(Tally::default());

    // Fan-in tier.
    let consumed = Arc::clone(&tally);
    let (results, consume_done) = spawn_worker(
        bus.clone(),
        Arc::from(format!("{name}-consume")),
        spec.consume_capacity,
        move |item: R| {
            let fut = consume(item);
            let consumed = Arc::clone(&consumed);
            async move {
                fut.await;
                consumed.consumed.fetch_add(1, Ordering::Relaxed);
            }
        },
    );

    // Fan-out tier.
    let forward = results.sender();
    let transformed = Arc::clone(&tally);
    let transform = Arc::new(transform);
    let stage: Arc<str> = Arc::from(format!("{name}-transform"));
    let (inputs, counter) = spawn_pool(
        bus.clone(),
        stage,
        width,
        spec.transform_capacity,
        move |item: T| {
            let transform = Arc::clone(&transform);
            let forward = forward.clone();
            let transformed = Arc::clone(&transformed);
            async move {
                let out = transform(item).await;
                match forward.send(out).await {
                    Ok(()) => {
                        transformed.transformed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => error!(error = %err, "transform result rejected by consume queue"),
                }
            }
        },
    );

    bus.publish(
        Event::new(EventKind::BatchStarted)
            .with_task(Arc::clone(&batch))
            .with_count(width as u64),
    );
    info!(batch = %batch, transformers = width, "batch started");

    let senders = inputs.iter().map(Producer::sender).collect();
    let generated = run_contained(async { generate(senders).await }).await;
    if let Err(fault) = &generated {
        report(&bus, &Arc::from(format!("{name}-generate")), fault);
    }
    bus.publish(Event::new(EventKind::BatchGenerated).with_task(Arc::clone(&batch)));

    close_all_and_wait(inputs, counter).await;
    close_and_wait(results, consume_done).await;

    let report = BatchReport {
        transformed: tally.transformed.load(Ordering::Relaxed),
        consumed: tally.consumed.load(Ordering::Relaxed),
    };
    bus.publish(
        Event::new(EventKind::BatchDrained)
            .with_task(Arc::clone(&batch))
            .with_count(report.consumed),
    );
    info!(
        batch = %batch,
        transformed = report.transformed,
        consumed = report.consumed,
        "batch drained"
    );
    generated.map(|()| report)
}
