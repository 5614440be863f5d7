//! # Fault-contained mapper.
//!
//! One task reads `input`, applies `f` to each item and writes the result to
//! `output`. A faulting item never stops the task:
//!
//! ```text
//! loop {
//!   item = input.recv()                    None ─► close output, fire Done
//!   run_contained(f(item.clone()))
//!     ├─ Ok(out) ─► output.send(out)       consumer gone ─► stop
//!     └─ Fault   ─► on_fault(ItemFault { item, fault }), nothing written
//! }
//! ```
//!
//! ## Rules
//! - A faulting item is **dropped**: nothing is written to `output` for it.
//! - `on_fault` receives the original input together with the [`Fault`], so the
//!   caller can retry or re-enqueue it.
//! - `on_fault` is itself contained; a panic inside it is logged and published.
//! - When `input` reaches end-of-stream the mapper closes `output`, so a downstream
//!   stage sees end-of-stream too.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error};

use crate::core::runner::{call_contained, report, run_contained};
use crate::error::{Fault, ItemFault};
use crate::events::{Bus, Event, EventKind};
use crate::queue::{Producer, Receiver};
use crate::signals::{completion, Done};

/// Spawns a mapper task from `input` to `output`.
pub(crate) fn spawn_mapper<T, R, F, Fut, H>(
    bus: Bus,
    name: Arc<str>,
    f: F,
    mut input: Receiver<T>,
    output: Producer<R>,
    on_fault: H,
) -> Done
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    H: Fn(ItemFault<T>) + Send + Sync + 'static,
{
    let (signal, done) = completion();

    tokio::spawn(async move {
        bus.publish(Event::new(EventKind::WorkerStarting).with_task(Arc::clone(&name)));
        debug!(task = %name, "mapper starting");

        let mut mapped: u64 = 0;
        while let Some(item) = input.recv().await {
            let retry = item.clone();
            match run_contained(async { f(item).await }).await {
                Ok(out) => {
                    if let Err(err) = output.send(out).await {
                        error!(
                            task = %name,
                            error = %err,
                            "mapper output rejected result; stopping"
                        );
                        break;
                    }
                    mapped += 1;
                }
                Err(fault) => {
                    report(&bus, &name, &fault);
                    notify(&bus, &name, &on_fault, retry, fault);
                }
            }
        }

        output.close();
        bus.publish(
            Event::new(EventKind::WorkerStopped)
                .with_task(Arc::clone(&name))
                .with_count(mapped),
        );
        debug!(task = %name, mapped, "mapper stopped");
        signal.complete();
    });
    done
}

fn notify<T, H>(bus: &Bus, name: &Arc<str>, on_fault: &H, item: T, fault: Fault)
where
    H: Fn(ItemFault<T>),
{
    if let Err(nested) = call_contained(|| on_fault(ItemFault { item, fault })) {
        report(bus, name, &nested);
    }
}
