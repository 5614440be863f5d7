//! # Closable, capacity-bounded FIFO queues.
//!
//! The substrate every other component is built from. A queue has exactly one
//! owner that may close it, any number of send-only handles, and one receiver.
//!
//! ```text
//!   Producer<T> ──(owner: send + close)──┐
//!   Sender<T>   ──(send only, Clone)─────┼──► [ Open(cap) | Closed ] ──► Receiver<T>
//!   Sender<T>   ──(send only, Clone)─────┘
//! ```
//!
//! ## Rules
//! - FIFO per queue; with several senders only each sender's own order is kept.
//! - [`Producer::close`] consumes the producer, so a second close does not compile.
//! - Dropping the [`Producer`] closes the queue as well.
//! - After close, buffered items are still delivered; then `recv` yields `None`.
//! - Sending after close returns [`SendError::Closed`], never `Ok`.
//!
//! ## Example
//! ```rust
//! use taskline::{queue, Capacity};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (tx, mut rx) = queue::<u32>(Capacity::Bounded(4));
//! tx.send(1).await.unwrap();
//! tx.send(2).await.unwrap();
//! tx.close();
//!
//! assert_eq!(rx.recv().await, Some(1));
//! assert_eq!(rx.recv().await, Some(2));
//! assert_eq!(rx.recv().await, None);
//! # }
//! ```

mod channel;
mod error;

use std::sync::Arc;

pub use channel::Capacity;
pub use error::{SendError, TryRecvError, TrySendError};

use channel::Channel;

/// Creates a new queue and returns its owning producer and its receiver.
pub fn queue<T>(capacity: impl Into<Capacity>) -> (Producer<T>, Receiver<T>) {
    let chan = Arc::new(Channel::new(capacity.into()));
    (
        Producer {
            chan: Arc::clone(&chan),
        },
        Receiver { chan },
    )
}

/// Owning end of a queue: the only handle able to close it.
pub struct Producer<T> {
    chan: Arc<Channel<T>>,
}

impl<T> Producer<T> {
    /// Sends an item, suspending while the buffer is full.
    pub async fn send(&self, item: T) -> Result<(), SendError<T>> {
        self.chan.push(item).await
    }

    /// Sends without suspending.
    pub fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        self.chan.try_push(item)
    }

    /// Returns a send-only handle onto the same queue.
    pub fn sender(&self) -> Sender<T> {
        Sender {
            chan: Arc::clone(&self.chan),
        }
    }

    /// Signals "no further work will arrive".
    pub fn close(self) {
        self.chan.close();
    }

    /// True once the receiver has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.chan.is_disconnected()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.chan.close();
    }
}

/// Cloneable send-only handle. Cannot close the queue.
pub struct Sender<T> {
    chan: Arc<Channel<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            chan: Arc::clone(&self.chan),
        }
    }
}

impl<T> Sender<T> {
    /// Sends an item, suspending while the buffer is full.
    pub async fn send(&self, item: T) -> Result<(), SendError<T>> {
        self.chan.push(item).await
    }

    /// Sends without suspending.
    pub fn try_send(&self, item: T) -> Result<(), TrySendError<T>> {
        self.chan.try_push(item)
    }

    /// True once the owner has closed the queue.
    pub fn is_closed(&self) -> bool {
        self.chan.is_closed()
    }
}

/// Receiving end of a queue.
pub struct Receiver<T> {
    chan: Arc<Channel<T>>,
}

impl<T> Receiver<T> {
    /// Receives the next item; `None` once the queue is closed and drained.
    ///
    /// Cancel-safe: dropping the future never loses an item.
    pub async fn recv(&mut self) -> Option<T> {
        self.chan.pop().await
    }

    /// Receives without suspending.
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.chan.try_pop()
    }

    /// True once the owner has closed the queue (items may still be buffered).
    pub fn is_closed(&self) -> bool {
        self.chan.is_closed()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.chan.len()
    }

    /// True if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.chan.detach_receiver();
    }
}

impl<T> std::fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer").field("len", &self.chan.len()).finish()
    }
}

impl<T> std::fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("closed", &self.chan.is_closed())
            .finish()
    }
}

impl<T> std::fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("len", &self.chan.len())
            .field("closed", &self.chan.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, mut rx) = queue::<u32>(Capacity::Bounded(8));
        for i in 0..5 {
            tx.send(i).await.unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.recv().await, Some(i));
        }
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_close_drains_buffer_then_ends() {
        let (tx, mut rx) = queue::<&str>(Capacity::Unbounded);
        tx.send("a").await.unwrap();
        tx.send("b").await.unwrap();
        tx.close();

        assert!(rx.is_closed());
        assert_eq!(rx.recv().await, Some("a"));
        assert_eq!(rx.recv().await, Some("b"));
        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Closed));
    }

    #[tokio::test]
    async fn test_send_after_close_is_rejected() {
        let (tx, _rx) = queue::<u32>(Capacity::Bounded(4));
        let sender = tx.sender();
        tx.close();

        assert!(sender.is_closed());
        match sender.send(7).await {
            Err(SendError::Closed(item)) => assert_eq!(item, 7),
            other => panic!("expected Closed, got {other:?}"),
        }
        let err = sender.try_send(8).unwrap_err();
        assert!(!err.is_full());
        assert_eq!(err.into_inner(), 8);
    }

    #[tokio::test]
    async fn test_dropping_producer_closes() {
        let (tx, mut rx) = queue::<u32>(Capacity::Bounded(4));
        let sender = tx.sender();
        sender.send(1).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropping_receiver_disconnects() {
        let (tx, rx) = queue::<u32>(Capacity::Bounded(4));
        drop(rx);
        assert!(tx.is_disconnected());
        let err = tx.send(3).await.unwrap_err();
        assert_eq!(err.as_label(), "queue_disconnected");
        assert_eq!(err.into_inner(), 3);
    }

    #[tokio::test]
    async fn test_try_send_full() {
        let (tx, mut rx) = queue::<u32>(Capacity::Bounded(1));
        tx.try_send(1).unwrap();
        assert!(tx.try_send(2).unwrap_err().is_full());
        assert_eq!(rx.recv().await, Some(1));
        tx.try_send(2).unwrap();
    }

    #[tokio::test]
    async fn test_zero_capacity_holds_one_item() {
        let (tx, _rx) = queue::<u32>(Capacity::Bounded(0));
        tx.try_send(1).unwrap();
        assert!(tx.try_send(2).unwrap_err().is_full());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_send_applies_backpressure() {
        let (tx, mut rx) = queue::<u32>(Capacity::Bounded(1));
        tx.send(1).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.send(2)).await;
        assert!(blocked.is_err(), "send must suspend while the buffer is full");

        let sender = tx.sender();
        let pending = tokio::spawn(async move { sender.send(3).await });
        assert_eq!(rx.recv().await, Some(1));
        pending.await.unwrap().unwrap();
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_receiver() {
        let (tx, mut rx) = queue::<u32>(Capacity::Bounded(1));
        let waiter = tokio::spawn(async move { rx.recv().await });
        tokio::task::yield_now().await;
        tx.close();
        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_sender() {
        let (tx, mut rx) = queue::<u32>(Capacity::Bounded(1));
        tx.send(1).await.unwrap();
        let sender = tx.sender();
        let blocked = tokio::spawn(async move { sender.send(2).await });
        tokio::task::yield_now().await;
        tx.close();

        let err = blocked.await.unwrap().unwrap_err();
        assert_eq!(err.as_label(), "queue_closed");
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, None);
    }
}
