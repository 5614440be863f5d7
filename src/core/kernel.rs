//! # Kernel: entry point for workers, pipelines, mappers and timers.
//!
//! The [`Kernel`] owns the event bus, an optional [`SubscriberSet`], and the
//! configuration. Every task it starts publishes to the same bus.
//!
//! ## High-level architecture
//! ```text
//! Kernel::builder(cfg).with_subscribers(subs).build()
//!   ├─► Bus::new(cfg.bus_capacity)
//!   └─► listener: Bus.subscribe() ─► SubscriberSet::emit(&Event)   (only if subs non-empty)
//!
//! Starting work:
//!   start_worker(name, cap, handler)      ─► (Producer<T>, Done)
//!   start_workers(name, n, cap, handler)  ─► (Vec<Producer<T>>, Counter)
//!   process_batch(name, spec, g, x, c)    ─► Result<BatchReport, Fault>
//!   spawn_mapper(name, f, in, out, h)     ─► Done
//!   watchdog(name, interval, handler)     ─► (Watchdog, Resetter)
//!   with_time_limit(f, on_expiry, limit)  ─► Result<V, Fault>
//!
//! Stopping work:
//!   close_and_wait(producer, done)                    (free fn, waits forever)
//!   kernel.close_and_wait_within(producer, done)      (gives up after cfg.grace)
//!
//! Event flow:
//!   worker / pipeline / timer ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                      └──► Kernel::subscribe() receivers
//!
//! Kernel::shutdown():
//!   cancel listener ─► forward events already on the bus ─► SubscriberSet::shutdown()
//! ```
//!
//! ## Example
//! ```rust
//! use taskline::{close_and_wait, Capacity, Kernel, KernelConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let kernel = Kernel::new(KernelConfig::default());
//!
//!     let (input, done) = kernel.start_worker("printer", Capacity::Bounded(8), |line: String| async move {
//!         println!("{line}");
//!     });
//!     input.send("hello".to_string()).await.unwrap();
//!     close_and_wait(input, done).await;
//!
//!     kernel.shutdown().await;
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::builder::KernelBuilder;
use super::config::KernelConfig;
use super::lifecycle;
use crate::error::{Fault, ItemFault, RuntimeError};
use crate::events::{Bus, Event};
use crate::queue::{queue, Capacity, Producer, Receiver, Sender};
use crate::signals::{Counter, Done};
use crate::subscribers::SubscriberSet;
use crate::tasks::{mapper, pipeline, worker, BatchReport, BatchSpec};
use crate::timers::{deadline, watchdog, Resetter, Watchdog};

struct Listener {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

/// Entry point of the concurrency kernel.
pub struct Kernel {
    cfg: KernelConfig,
    bus: Bus,
    listener: Option<Listener>,
}

impl Kernel {
    /// Creates a kernel without subscribers.
    pub fn new(cfg: KernelConfig) -> Self {
        KernelBuilder::new(cfg).build()
    }

    /// Returns a builder for a kernel with subscribers.
    pub fn builder(cfg: KernelConfig) -> KernelBuilder {
        KernelBuilder::new(cfg)
    }

    pub(super) fn new_internal(cfg: KernelConfig, bus: Bus, subs: Option<SubscriberSet>) -> Self {
        let listener = subs.map(|set| Self::subscriber_listener(&bus, set));
        Self { cfg, bus, listener }
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    fn subscriber_listener(bus: &Bus, set: SubscriberSet) -> Listener {
        let mut rx = bus.subscribe();
        let stop = CancellationToken::new();
        let token = stop.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "subscriber listener lagged; events skipped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            while let Ok(ev) = rx.try_recv() {
                set.emit(&ev);
            }
            set.shutdown().await;
        });
        Listener { stop, handle }
    }

    /// The kernel's configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.cfg
    }

    /// The shared event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// A raw receiver of every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Creates a queue with the configured default capacity.
    pub fn queue<T>(&self) -> (Producer<T>, Receiver<T>) {
        queue(self.cfg.default_capacity())
    }

    /// A batch spec with `transformers` tasks and the configured default capacity on both tiers.
    pub fn batch_spec(&self, transformers: usize) -> BatchSpec {
        let cap = self.cfg.default_capacity();
        BatchSpec::new(transformers, cap, cap)
    }

    /// Starts one worker bound to a fresh input queue.
    ///
    /// The worker handles items in send order until the input is closed and
    /// drained, then fires the returned [`Done`]. A panicking item is dropped
    /// and reported; the worker keeps going.
    pub fn start_worker<T, F, Fut>(
        &self,
        name: impl Into<Arc<str>>,
        capacity: impl Into<Capacity>,
        handler: F,
    ) -> (Producer<T>, Done)
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        worker::spawn_worker(self.bus.clone(), name.into(), capacity.into(), handler)
    }

    /// Starts `n` workers, each with its own input queue, sharing one handler.
    ///
    /// The caller routes items across the returned producers. The [`Counter`]
    /// already counts all `n` workers when this returns.
    pub fn start_workers<T, F, Fut>(
        &self,
        name: impl Into<Arc<str>>,
        n: usize,
        capacity: impl Into<Capacity>,
        handler: F,
    ) -> (Vec<Producer<T>>, Counter)
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        worker::spawn_pool(self.bus.clone(), name.into(), n, capacity.into(), handler)
    }

    /// Closes `input` and waits for the worker, giving up after the configured grace.
    pub async fn close_and_wait_within<T>(
        &self,
        input: Producer<T>,
        done: Done,
    ) -> Result<(), RuntimeError> {
        lifecycle::close_and_wait_within(&self.bus, input, done, self.cfg.grace_limit()).await
    }

    /// Closes every input and waits for the pool, giving up after the configured grace.
    pub async fn close_all_and_wait_within<T>(
        &self,
        inputs: Vec<Producer<T>>,
        counter: Counter,
    ) -> Result<(), RuntimeError> {
        lifecycle::close_all_and_wait_within(&self.bus, inputs, counter, self.cfg.grace_limit())
            .await
    }

    /// Runs one generate ─► transform ─► consume batch to completion.
    ///
    /// `generate` receives one sender per transform task and routes items itself.
    /// Returns once every tier has drained; see [`BatchReport`].
    pub async fn process_batch<T, R, G, GFut, X, XFut, C, CFut>(
        &self,
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
        pipeline::process_batch(self.bus.clone(), name, spec, generate, transform, consume).await
    }

    /// Starts a mapper from `input` to `output`; a faulting item goes to `on_fault`.
    ///
    /// `output` is closed once `input` reaches end-of-stream.
    pub fn spawn_mapper<T, R, F, Fut, H>(
        &self,
        name: impl Into<Arc<str>>,
        f: F,
        input: Receiver<T>,
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
        mapper::spawn_mapper(self.bus.clone(), name.into(), f, input, output, on_fault)
    }

    /// Starts a watchdog that calls `handler` when no reset arrives for `interval`.
    pub fn watchdog<F>(
        &self,
        name: impl Into<Arc<str>>,
        interval: Duration,
        handler: F,
    ) -> (Watchdog, Resetter)
    where
        F: Fn() + Send + Sync + 'static,
    {
        watchdog::spawn_watchdog(self.bus.clone(), name.into(), interval, handler)
    }

    /// Races `f` against `limit`; on expiry returns `on_expiry(expiry time)`.
    ///
    /// `f` runs on its own task and receives a token that is cancelled on expiry.
    pub async fn with_time_limit<V, F, Fut, E>(
        &self,
        f: F,
        on_expiry: E,
        limit: Duration,
    ) -> Result<V, Fault>
    where
        V: Send + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = V> + Send + 'static,
        E: FnOnce(SystemTime) -> V,
    {
        deadline::with_time_limit(&self.bus, f, on_expiry, limit).await
    }

    /// Stops the subscriber listener and waits for subscribers to drain.
    ///
    /// Events already published are still delivered.
    pub async fn shutdown(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop.cancel();
            if let Err(err) = listener.handle.await {
                warn!(error = %err, "subscriber listener ended abnormally");
            }
        }
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        if let Some(listener) = &self.listener {
            listener.stop.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::subscribers::Subscribe;
    use crate::{close_all_and_wait, close_and_wait};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.kinds.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Subscribe for Exploder {
        async fn on_event(&self, ev: &Event) {
            panic!("exploder fails on {:?}", ev.kind);
        }
        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_worker_lifecycle() {
        let rec = Arc::new(Recorder::default());
        let kernel = Kernel::builder(KernelConfig::default())
            .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
            .build();

        let (input, done) = kernel.start_worker("w", Capacity::Bounded(2), |_: u8| async {});
        input.send(1).await.unwrap();
        close_and_wait(input, done).await;
        kernel.shutdown().await;

        assert_eq!(
            *rec.kinds.lock().unwrap(),
            vec![EventKind::WorkerStarting, EventKind::WorkerStopped]
        );
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_affect_others() {
        let rec = Arc::new(Recorder::default());
        let kernel = Kernel::builder(KernelConfig::default())
            .with_subscribers(vec![
                Arc::new(Exploder) as Arc<dyn Subscribe>,
                rec.clone() as Arc<dyn Subscribe>,
            ])
            .build();
        let mut events = kernel.subscribe();

        let (input, done) = kernel.start_worker("w", Capacity::Bounded(2), |_: u8| async {});
        close_and_wait(input, done).await;

        // two panics, one per worker event; panics on the panic events stay local
        let mut panics = 0;
        while panics < 2 {
            if events.recv().await.unwrap().kind == EventKind::SubscriberPanicked {
                panics += 1;
            }
        }
        kernel.shutdown().await;

        let kinds = rec.kinds.lock().unwrap();
        assert!(kinds.contains(&EventKind::WorkerStarting));
        assert!(kinds.contains(&EventKind::WorkerStopped));
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::SubscriberPanicked).count(),
            2
        );
    }

    #[tokio::test]
    async fn test_pool_through_kernel() {
        let kernel = Kernel::new(KernelConfig::default());
        let total = Arc::new(AtomicUsize::new(0));
        let sum = Arc::clone(&total);

        let name = String::from("adders");
        let (inputs, counter) =
            kernel.start_workers(name, 3, Capacity::Bounded(4), move |x: usize| {
                let sum = Arc::clone(&sum);
                async move {
                    sum.fetch_add(x, Ordering::SeqCst);
                }
            });
        for x in 1..=9 {
            inputs[x % 3].send(x).await.unwrap();
        }
        close_all_and_wait(inputs, counter).await;
        assert_eq!(total.load(Ordering::SeqCst), 45);
    }

    #[tokio::test]
    async fn test_batch_with_configured_capacity() {
        let kernel = Kernel::new(KernelConfig {
            queue_capacity: 2,
            ..KernelConfig::default()
        });
        let spec = kernel.batch_spec(3);
        assert_eq!(spec.transform_capacity, Capacity::Bounded(2));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let report = kernel
            .process_batch(
                "evens",
                spec,
                |senders: Vec<Sender<u32>>| async move {
                    for x in 0..10u32 {
                        senders[x as usize % senders.len()].send(x).await.unwrap();
                    }
                },
                |x: u32| async move { x * 2 },
                move |y: u32| {
                    let sink = Arc::clone(&sink);
                    async move { sink.lock().unwrap().push(y) }
                },
            )
            .await
            .unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
        assert_eq!(report.consumed, 10);
    }

    #[tokio::test]
    async fn test_mapper_through_kernel_feeds_next_stage() {
        let kernel = Kernel::new(KernelConfig::default());
        let (tx, rx) = kernel.queue::<u32>();
        let (out, mut results) = kernel.queue::<String>();
        let faults = Arc::new(AtomicUsize::new(0));
        let seen_faults = Arc::clone(&faults);

        let mut done = kernel.spawn_mapper(
            "fmt",
            |x: u32| async move {
                assert!(x != 7, "seven is unlucky");
                format!("#{x}")
            },
            rx,
            out,
            move |_fault: ItemFault<u32>| {
                seen_faults.fetch_add(1, Ordering::SeqCst);
            },
        );
        for x in [1, 7, 3] {
            tx.send(x).await.unwrap();
        }
        tx.close();
        done.wait().await;

        let mut got = Vec::new();
        while let Some(s) = results.recv().await {
            got.push(s);
        }
        assert_eq!(got, vec!["#1".to_string(), "#3".to_string()]);
        assert_eq!(faults.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_through_kernel() {
        let kernel = Kernel::new(KernelConfig::default());
        let fired = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&fired);

        let (dog, reset) = kernel.watchdog("hb", Duration::from_millis(50), move || {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert!(reset.reset());
        tokio::time::sleep(Duration::from_millis(60)).await;
        dog.stop().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let slow = kernel
            .with_time_limit(
                |_token| async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    1
                },
                |_at| 0,
                Duration::from_millis(50),
            )
            .await;
        assert_eq!(slow, Ok(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_within_uses_configured_grace() {
        let kernel = Kernel::new(KernelConfig {
            grace: Duration::from_millis(200),
            ..KernelConfig::default()
        });
        let (input, done) = kernel.start_worker("hang", Capacity::Bounded(1), |_: ()| {
            std::future::pending::<()>()
        });
        input.send(()).await.unwrap();

        let err = kernel.close_and_wait_within(input, done).await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_grace_exceeded");
    }
}
