//! # taskline
//!
//! **Taskline** is a small concurrency kernel for Rust: closable queues, worker
//! tasks and pools bound to them, a batch pipeline, a fault-contained mapper, a
//! debounced watchdog and a deadline race.
//!
//! Every component follows one rule: a task runs until its input queue is
//! closed and drained, and "shutdown" means "close the input, then wait".
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        caller
//!   ┌──────┴──────────────────────────────────────────────────────────┐
//!   │ Kernel (entry point)                                            │
//!   │  - Bus (broadcast events)                                       │
//!   │  - SubscriberSet (fans out to user subscribers)                 │
//!   │  - KernelConfig (grace, bus capacity, default queue capacity)   │
//!   └──┬──────────────┬──────────────┬──────────────┬─────────────┬───┘
//!      ▼              ▼              ▼              ▼             ▼
//!  start_worker   start_workers  process_batch  spawn_mapper   watchdog /
//!  (Producer,     (Producers,    (generate ─►   (in ─► f ─►    with_time_limit
//!   Done)          Counter)       transform ─►   out)
//!                                 consume)
//!      │              │              │              │             │
//!      └──────────────┴──────┬───────┴──────────────┴─────────────┘
//!                            ▼ publish(Event)
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │               (capacity: KernelConfig::bus_capacity)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       │      (in Kernel)       │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                     sub1.on   sub2.on   subN.on
//!                     _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! queue(cap) ──► (Producer, Receiver) ──► worker loop
//!
//! loop {
//!   ├─► item = input.recv()
//!   │     └─ None (closed + drained) ─► exit
//!   ├─► run_contained(handler(item))
//!   │     ├─ Ok    ─► continue
//!   │     └─ Fault ─► warn + ItemFaulted, item dropped, continue
//! }
//!
//! On exit: WorkerStopped, then Done fires (or the pool Counter drops by one).
//!
//! Caller side:
//!   close_and_wait(producer, done)        close ─► wait for Done
//!   close_all_and_wait(producers, count)  close all ─► wait for Counter == 0
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                        |
//! |-------------------|-----------------------------------------------------------------|-------------------------------------------|
//! | **Queues**        | Closable FIFO queues with one owner and cloneable senders.      | [`queue`], [`Producer`], [`Sender`], [`Receiver`] |
//! | **Workers**       | Single workers and fixed-size pools, two-phase shutdown.        | [`Kernel`], [`Done`], [`Counter`]         |
//! | **Pipelines**     | Fan-out/fan-in batches with ordered shutdown.                   | [`BatchSpec`], [`BatchReport`]            |
//! | **Timers**        | Debounced watchdog and deadline race.                           | [`Watchdog`], [`Resetter`]                |
//! | **Subscriber API**| Hook into kernel events (logging, metrics, custom subscribers). | [`Subscribe`]                             |
//! | **Errors**        | Typed errors for queues, faults and shutdown.                   | [`Fault`], [`RuntimeError`], [`SendError`] |
//! | **Configuration** | Centralize kernel settings.                                     | [`KernelConfig`]                          |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that renders events via `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use taskline::{BatchSpec, Kernel, KernelConfig, Sender};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let kernel = Kernel::new(KernelConfig::default());
//!     let results = Arc::new(Mutex::new(Vec::new()));
//!     let sink = Arc::clone(&results);
//!
//!     let report = kernel
//!         .process_batch(
//!             "double",
//!             BatchSpec::default(),
//!             |senders: Vec<Sender<u32>>| async move {
//!                 for x in 0..10u32 {
//!                     let _ = senders[x as usize % senders.len()].send(x).await;
//!                 }
//!             },
//!             |x: u32| async move { x * 2 },
//!             move |y: u32| {
//!                 let sink = Arc::clone(&sink);
//!                 async move { sink.lock().unwrap().push(y) }
//!             },
//!         )
//!         .await?;
//!
//!     assert_eq!(report.consumed, 10);
//!     kernel.shutdown().await;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod queue;
mod signals;
mod subscribers;
mod tasks;
mod timers;

// ---- Public re-exports ----

pub use crate::core::{close_all_and_wait, close_and_wait, Kernel, KernelBuilder, KernelConfig};
pub use error::{Fault, ItemFault, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use queue::{queue, Capacity, Producer, Receiver, SendError, Sender, TryRecvError, TrySendError};
pub use signals::{Counter, Done};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BatchReport, BatchSpec};
pub use timers::{Resetter, Watchdog};

// Optional: expose a simple built-in tracing subscriber.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
