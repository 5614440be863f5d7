//! # Deadline race.
//!
//! Runs a computation on its own task and races it against a timer:
//!
//! ```text
//!   spawn f(token) ──┬── finishes first ──► Ok(value)
//!                    ├── panics first   ──► Err(Fault)
//!   sleep(limit) ────┴── expires first  ──► token.cancel(); Ok(on_expiry(now))
//! ```
//!
//! The losing computation is not aborted: it receives a [`CancellationToken`]
//! and is expected to observe it (`token.cancelled()`) and return. A computation
//! that ignores the token keeps running until it finishes on its own.

use std::future::Future;
use std::time::{Duration, SystemTime};

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::runner::call_contained;
use crate::error::Fault;
use crate::events::{Bus, Event, EventKind};

/// Returns the computation's value if it beats `limit`, otherwise `on_expiry(expiry time)`.
pub(crate) async fn with_time_limit<V, F, Fut, E>(
    bus: &Bus,
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
    let token = CancellationToken::new();
    let child = token.clone();
    // Call f on the spawned task; its synchronous prefix must be raced and contained.
    let mut handle = tokio::spawn(async move { f(child).await });

    match time::timeout(limit, &mut handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join)) => Err(Fault::from_join(join)),
        Err(_elapsed) => {
            token.cancel();
            bus.publish(Event::new(EventKind::DeadlineExpired).with_timeout(limit));
            debug!(?limit, "deadline expired; using fallback");
            call_contained(|| on_expiry(SystemTime::now()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const LIMIT: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn test_slow_computation_loses() {
        let bus = Bus::new(4);
        let mut events = bus.subscribe();
        let out = with_time_limit(
            &bus,
            |_token| async {
                time::sleep(Duration::from_millis(100)).await;
                1
            },
            |_at| 0,
            LIMIT,
        )
        .await;
        assert_eq!(out, Ok(0));

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::DeadlineExpired);
        assert_eq!(ev.timeout_ms, Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_computation_wins() {
        let out = with_time_limit(&Bus::new(1), |_token| async { 1 }, |_at| 0, LIMIT).await;
        assert_eq!(out, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loser_observes_cancellation() {
        let observed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&observed);

        let out = with_time_limit(
            &Bus::new(1),
            move |token| async move {
                token.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                "late"
            },
            |_at| "fallback",
            LIMIT,
        )
        .await;
        assert_eq!(out, Ok("fallback"));

        tokio::task::yield_now().await;
        time::sleep(Duration::from_millis(1)).await;
        assert!(observed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_computation_is_a_fault() {
        let out: Result<u8, Fault> = with_time_limit(
            &Bus::new(1),
            |_token| async { panic!("compute failed") },
            |_at| 0,
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(out.unwrap_err().message(), "compute failed");
    }

    #[tokio::test]
    async fn test_panic_before_first_await_is_a_fault() {
        let out = with_time_limit(
            &Bus::new(1),
            |_token| -> std::future::Ready<u8> { panic!("failed before starting") },
            |_at| 0,
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(out.unwrap_err().message(), "failed before starting");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_time_is_passed_to_fallback() {
        let before = SystemTime::now();
        let at = with_time_limit(
            &Bus::new(1),
            |token| async move {
                token.cancelled().await;
                None
            },
            Some,
            LIMIT,
        )
        .await
        .unwrap();
        assert!(at.unwrap() >= before);
    }
}
