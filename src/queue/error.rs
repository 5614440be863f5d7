//! # Queue errors.
//!
//! Send errors hand the rejected item back to the caller, so nothing is lost
//! silently. [`SendError::Closed`] is a **contract violation**: the owner already
//! declared "no more work", and a well-formed program never observes it.

use std::fmt;

use thiserror::Error;

/// Error returned by [`Sender::send`](crate::Sender::send) and [`Producer::send`](crate::Producer::send).
pub enum SendError<T> {
    /// The queue was closed by its [`Producer`](crate::Producer).
    Closed(T),
    /// The [`Receiver`](crate::Receiver) was dropped; nobody will ever read the item.
    Disconnected(T),
}

impl<T> SendError<T> {
    /// Returns the item that could not be delivered.
    pub fn into_inner(self) -> T {
        match self {
            SendError::Closed(item) | SendError::Disconnected(item) => item,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SendError::Closed(_) => "queue_closed",
            SendError::Disconnected(_) => "queue_disconnected",
        }
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Closed(_) => f.write_str("Closed(..)"),
            SendError::Disconnected(_) => f.write_str("Disconnected(..)"),
        }
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Closed(_) => f.write_str("send on closed queue"),
            SendError::Disconnected(_) => f.write_str("send on queue without receiver"),
        }
    }
}

impl<T> std::error::Error for SendError<T> {}

/// Error returned by the non-blocking `try_send`.
pub enum TrySendError<T> {
    /// The buffer is at capacity.
    Full(T),
    /// The queue was closed by its [`Producer`](crate::Producer).
    Closed(T),
    /// The [`Receiver`](crate::Receiver) was dropped.
    Disconnected(T),
}

impl<T> TrySendError<T> {
    /// Returns the item that could not be delivered.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(item)
            | TrySendError::Closed(item)
            | TrySendError::Disconnected(item) => item,
        }
    }

    /// True if the item was rejected only because the buffer is full.
    pub fn is_full(&self) -> bool {
        matches!(self, TrySendError::Full(_))
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => f.write_str("Full(..)"),
            TrySendError::Closed(_) => f.write_str("Closed(..)"),
            TrySendError::Disconnected(_) => f.write_str("Disconnected(..)"),
        }
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::Full(_) => f.write_str("queue is full"),
            TrySendError::Closed(_) => f.write_str("send on closed queue"),
            TrySendError::Disconnected(_) => f.write_str("send on queue without receiver"),
        }
    }
}

impl<T> std::error::Error for TrySendError<T> {}

/// Error returned by [`Receiver::try_recv`](crate::Receiver::try_recv).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// Nothing buffered right now, but the queue is still open.
    #[error("queue is empty")]
    Empty,
    /// Closed and fully drained: end-of-stream.
    #[error("queue is closed and drained")]
    Closed,
}
