//! # Debounced watchdog.
//!
//! Fires a handler when no reset has arrived for one `interval`.
//!
//! ```text
//!            reset()            reset()
//!   ──────────┼──────────────────┼──────────────── interval ──► fire
//!                                                                 │
//!                                           cool down one interval ◄┘
//!                                           drop queued resets
//!                                           re-baseline, wait again
//! ```
//!
//! ## Rules
//! - Deadline is `last reset + interval`; each reset pushes it forward.
//! - Resets coalesce: a burst of resets while the task is busy counts once.
//! - After firing, the watchdog waits one more interval before it watches again,
//!   so during continuous silence it fires at most once per two intervals.
//! - The handler is contained; a panic is logged and published, the loop goes on.
//! - [`Watchdog::stop`] is idempotent and returns once the task has exited.
//! - Dropping a [`Watchdog`] without `stop` still terminates the task.
//! - An interval too large to add to the clock (e.g. `Duration::MAX`) means "never fire".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::runner::{call_contained, report};
use crate::events::{Bus, Event, EventKind};
use crate::queue::{queue, Capacity, Receiver, Sender, TrySendError};
use crate::signals::{completion, Done};

/// Handle for stopping a running watchdog.
pub struct Watchdog {
    stop: CancellationToken,
    done: Mutex<Done>,
}

impl Watchdog {
    /// Stops the watchdog and waits until its task has exited.
    ///
    /// Calling it again is a no-op that returns immediately.
    pub async fn stop(&self) {
        self.stop.cancel();
        self.done.lock().await.wait().await;
    }

    /// True once the watchdog task has exited.
    pub fn is_stopped(&self) -> bool {
        self.done.try_lock().is_ok_and(|done| done.is_done())
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

impl std::fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("stopping", &self.stop.is_cancelled())
            .finish()
    }
}

/// Cloneable reset handle.
#[derive(Clone, Debug)]
pub struct Resetter {
    resets: Sender<()>,
}

impl Resetter {
    /// Pushes the watchdog's deadline forward.
    ///
    /// Returns `false` once the watchdog has stopped.
    pub fn reset(&self) -> bool {
        match self.resets.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) | Err(TrySendError::Disconnected(())) => false,
        }
    }
}

/// Starts a watchdog task.
pub(crate) fn spawn_watchdog<F>(
    bus: Bus,
    name: Arc<str>,
    interval: Duration,
    handler: F,
) -> (Watchdog, Resetter)
where
    F: Fn() + Send + Sync + 'static,
{
    let (owner, resets) = queue::<()>(Capacity::Bounded(1));
    let resetter = Resetter {
        resets: owner.sender(),
    };
    let stop = CancellationToken::new();
    let (signal, done) = completion();

    let token = stop.clone();
    tokio::spawn(async move {
        let fired = watch(&bus, &name, interval, resets, &token, &handler).await;
        owner.close();
        bus.publish(
            Event::new(EventKind::WatchdogStopped)
                .with_task(Arc::clone(&name))
                .with_count(fired),
        );
        debug!(task = %name, fired, "watchdog stopped");
        signal.complete();
    });

    (
        Watchdog {
            stop,
            done: Mutex::new(done),
        },
        resetter,
    )
}

async fn watch<F: Fn()>(
    bus: &Bus,
    name: &Arc<str>,
    interval: Duration,
    mut resets: Receiver<()>,
    stop: &CancellationToken,
    handler: &F,
) -> u64 {
    let mut fired: u64 = 0;
    let mut last = Instant::now();

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            reset = resets.recv() => match reset {
                Some(()) => last = Instant::now(),
                None => break,
            },
            _ = time::sleep_until(deadline_after(last, interval)) => {
                fired += 1;
                debug!(task = %name, fired, "watchdog fired");
                bus.publish(
                    Event::new(EventKind::WatchdogFired)
                        .with_task(Arc::clone(name))
                        .with_timeout(interval)
                        .with_count(fired),
                );
                if let Err(fault) = call_contained(handler) {
                    report(bus, name, &fault);
                }

                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = time::sleep_until(deadline_after(Instant::now(), interval)) => {}
                }
                while resets.try_recv().is_ok() {}
                last = Instant::now();
            }
        }
    }
    fired
}

/// `from + interval`, or roughly thirty years out when that overflows the clock.
fn deadline_after(from: Instant, interval: Duration) -> Instant {
    from.checked_add(interval)
        .unwrap_or_else(|| from + Duration::from_secs(86_400 * 365 * 30))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_resets_stop() {
        let (count, handler) = counting();
        let (dog, reset) =
            spawn_watchdog(Bus::new(8), Arc::from("wd"), Duration::from_millis(50), handler);

        for _ in 0..10 {
            time::sleep(Duration::from_millis(20)).await;
            assert!(reset.reset());
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        dog.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_firing_during_silence() {
        let bus = Bus::new(32);
        let mut events = bus.subscribe();
        let (count, handler) = counting();
        let (dog, _reset) =
            spawn_watchdog(bus, Arc::from("idle"), Duration::from_millis(10), handler);

        time::sleep(Duration::from_millis(95)).await;
        dog.stop().await;
        // fires at 10, 30, 50, 70, 90
        assert_eq!(count.load(Ordering::SeqCst), 5);

        let mut last = None;
        while let Ok(ev) = events.try_recv() {
            last = Some(ev);
        }
        let last = last.unwrap();
        assert_eq!(last.kind, EventKind::WatchdogStopped);
        assert_eq!(last.count, Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_handler_does_not_stop_watchdog() {
        let bus = Bus::new(32);
        let mut events = bus.subscribe();
        let (dog, _reset) =
            spawn_watchdog(bus, Arc::from("loud"), Duration::from_millis(10), || {
                panic!("alarm bell broke");
            });

        time::sleep(Duration::from_millis(35)).await;
        dog.stop().await;

        let faults = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::ItemFaulted)
            .count();
        assert_eq!(faults, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_disables_reset() {
        let (count, handler) = counting();
        let (dog, reset) =
            spawn_watchdog(Bus::new(8), Arc::from("wd"), Duration::from_secs(1), handler);

        dog.stop().await;
        dog.stop().await;
        assert!(dog.is_stopped());
        assert!(!reset.reset());

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_watchdog_terminates() {
        let (count, handler) = counting();
        let (dog, reset) =
            spawn_watchdog(Bus::new(8), Arc::from("wd"), Duration::from_millis(10), handler);
        drop(dog);

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!reset.reset());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_interval_never_fires() {
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let (count, handler) = counting();
        let (dog, reset) = spawn_watchdog(bus, Arc::from("never"), Duration::MAX, handler);

        time::sleep(Duration::from_millis(10)).await;
        assert!(!dog.is_stopped());
        assert!(reset.reset());
        time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        dog.stop().await;
        assert!(dog.is_stopped());
        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::WatchdogStopped);
        assert_eq!(ev.count, Some(0));
    }

    #[test]
    fn test_deadline_after_saturates() {
        let now = Instant::now();
        assert_eq!(
            deadline_after(now, Duration::from_millis(5)),
            now + Duration::from_millis(5)
        );
        assert!(deadline_after(now, Duration::MAX) > now + Duration::from_secs(86_400 * 365));
    }
}
