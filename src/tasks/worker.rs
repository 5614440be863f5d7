//! # Worker loops: single worker and fixed-size pools.
//!
//! A worker is one spawned task bound to one input queue and one handler:
//!
//! ```text
//! loop {
//!   ├─► item = input.recv()          (suspends while empty)
//!   │     └─ None (closed + drained) ─► break
//!   ├─► run_contained(handler(item))
//!   │     ├─ Ok    ─► handled += 1
//!   │     └─ Fault ─► warn + ItemFaulted, item dropped, continue
//! }
//! publish WorkerStopped; fire Done / drop CounterGuard
//! ```
//!
//! A pool is `n` such workers, each with its **own** input queue. The kernel does
//! no load balancing: the caller routes items (e.g. round-robin by index). A slow
//! handler in one worker never starves the others.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::core::runner::{report, run_contained};
use crate::events::{Bus, Event, EventKind};
use crate::queue::{queue, Capacity, Producer, Receiver};
use crate::signals::{completion, Counter, Done};

/// Drives one worker loop until its input reaches end-of-stream.
///
/// Returns the number of items the handler completed without faulting.
pub(crate) async fn drive<T, F, Fut>(
    bus: &Bus,
    name: &Arc<str>,
    mut input: Receiver<T>,
    handler: &F,
) -> u64
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = ()>,
{
    bus.publish(Event::new(EventKind::WorkerStarting).with_task(Arc::clone(name)));
    debug!(task = %name, "worker starting");

    let mut handled: u64 = 0;
    while let Some(item) = input.recv().await {
        match run_contained(async { handler(item).await }).await {
            Ok(()) => handled += 1,
            Err(fault) => report(bus, name, &fault),
        }
    }

    bus.publish(
        Event::new(EventKind::WorkerStopped)
            .with_task(Arc::clone(name))
            .with_count(handled),
    );
    debug!(task = %name, handled, "worker stopped");
    handled
}

/// Spawns one worker; returns its input queue and completion signal.
pub(crate) fn spawn_worker<T, F, Fut>(
    bus: Bus,
    name: Arc<str>,
    capacity: Capacity,
    handler: F,
) -> (Producer<T>, Done)
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (input, rx) = queue(capacity);
    let (signal, done) = completion();

    tokio::spawn(async move {
        drive(&bus, &name, rx, &handler).await;
        signal.complete();
    });
    (input, done)
}

/// Spawns `n` workers sharing one handler; worker `i` is named `{name}-{i}`.
pub(crate) fn spawn_pool<T, F, Fut>(
    bus: Bus,
    name: Arc<str>,
    n: usize,
    capacity: Capacity,
    handler: F,
) -> (Vec<Producer<T>>, Counter)
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let handler = Arc::new(handler);
    let counter = Counter::new();
    let mut inputs = Vec::with_capacity(n);

    for idx in 0..n {
        let (input, rx) = queue(capacity);
        let guard = counter.enter();
        let worker: Arc<str> = Arc::from(format!("{name}-{idx}"));
        let handler = Arc::clone(&handler);
        let bus = bus.clone();

        tokio::spawn(async move {
            drive(&bus, &worker, rx, handler.as_ref()).await;
            drop(guard);
        });
        inputs.push(input);
    }
    (inputs, counter)
}
