//! # Two-phase shutdown.
//!
//! Every component is shut down the same way:
//!
//! ```text
//!   1. close input(s)   ── "no further work will arrive"
//!   2. wait             ── Done fires / Counter reaches zero
//! ```
//!
//! Both helpers take the producers **by value**: once a queue has been handed to
//! the lifecycle it cannot be closed (or shut down) a second time. Calling them
//! when no item was ever sent is fine.
//!
//! Grace-bounded variants live on [`Kernel`](crate::Kernel) because they need the
//! configured grace and the event bus.

use std::time::Duration;

use tokio::time;
use tracing::warn;

use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::queue::Producer;
use crate::signals::{Counter, Done};

/// Closes a worker's input and waits until the worker has exited.
pub async fn close_and_wait<T>(input: Producer<T>, mut done: Done) {
    input.close();
    done.wait().await;
}

/// Closes every input of a pool and waits until all of its workers have exited.
pub async fn close_all_and_wait<T>(inputs: Vec<Producer<T>>, counter: Counter) {
    for input in inputs {
        input.close();
    }
    counter.wait().await;
}

/// Like [`close_and_wait`], but gives up after `grace` (`None` = wait forever).
pub(crate) async fn close_and_wait_within<T>(
    bus: &Bus,
    input: Producer<T>,
    mut done: Done,
    grace: Option<Duration>,
) -> Result<(), RuntimeError> {
    input.close();
    let Some(grace) = grace else {
        done.wait().await;
        return Ok(());
    };
    match time::timeout(grace, done.wait()).await {
        Ok(()) => Ok(()),
        Err(_elapsed) => Err(grace_exceeded(bus, grace, 1)),
    }
}

/// Like [`close_all_and_wait`], but gives up after `grace` (`None` = wait forever).
pub(crate) async fn close_all_and_wait_within<T>(
    bus: &Bus,
    inputs: Vec<Producer<T>>,
    counter: Counter,
    grace: Option<Duration>,
) -> Result<(), RuntimeError> {
    for input in inputs {
        input.close();
    }
    let Some(grace) = grace else {
        counter.wait().await;
        return Ok(());
    };
    match time::timeout(grace, counter.wait()).await {
        Ok(()) => Ok(()),
        Err(_elapsed) => Err(grace_exceeded(bus, grace, counter.running())),
    }
}

fn grace_exceeded(bus: &Bus, grace: Duration, running: usize) -> RuntimeError {
    warn!(?grace, running, "shutdown grace exceeded");
    bus.publish(
        Event::new(EventKind::GraceExceeded)
            .with_timeout(grace)
            .with_count(running as u64),
    );
    RuntimeError::GraceExceeded { grace, running }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Capacity;
    use crate::tasks::worker::{spawn_pool, spawn_worker};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_close_all_waits_for_every_item() {
        let handled = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&handled);
        let (inputs, counter) =
            spawn_pool(Bus::new(8), Arc::from("p"), 4, Capacity::Bounded(1), move |_: u32| {
                let count = Arc::clone(&count);
                async move {
                    tokio::task::yield_now().await;
                    count.fetch_add(1, Ordering::SeqCst);
                }
            });

        for i in 0..40u32 {
            inputs[(i % 4) as usize].send(i).await.unwrap();
        }
        close_all_and_wait(inputs, counter).await;
        assert_eq!(handled.load(Ordering::SeqCst), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_within_grace_reports_stuck_worker() {
        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let (input, done) =
            spawn_worker(bus.clone(), Arc::from("stuck"), Capacity::Bounded(1), |_: ()| {
                std::future::pending::<()>()
            });
        input.send(()).await.unwrap();

        let err = close_and_wait_within(&bus, input, done, Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::GraceExceeded { running: 1, .. }));

        let mut saw_grace = false;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::GraceExceeded {
                assert_eq!(ev.timeout_ms, Some(1_000));
                saw_grace = true;
            }
        }
        assert!(saw_grace);
    }

    #[tokio::test(start_paused = true)]
    async fn test_within_grace_pool_counts_running() {
        let bus = Bus::new(8);
        let (inputs, counter) = spawn_pool(
            bus.clone(),
            Arc::from("slow"),
            3,
            Capacity::Bounded(1),
            |x: u32| async move {
                if x == 0 {
                    std::future::pending::<()>().await;
                }
            },
        );
        for (i, input) in inputs.iter().enumerate() {
            input.send(i as u32).await.unwrap();
        }

        let grace = Some(Duration::from_millis(500));
        let err = close_all_and_wait_within(&bus, inputs, counter, grace)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::GraceExceeded { running: 1, .. }));
    }

    #[tokio::test]
    async fn test_within_without_grace_waits() {
        let bus = Bus::new(1);
        let (input, done) =
            spawn_worker(bus.clone(), Arc::from("quick"), Capacity::Bounded(1), |_: u8| async {});
        input.send(1).await.unwrap();
        close_and_wait_within(&bus, input, done, None).await.unwrap();
    }
}
