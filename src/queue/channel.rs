//! # Shared queue state.
//!
//! One [`Channel`] sits behind an `Arc` and is shared by the producer, its
//! senders and the receiver. All decisions are taken under a short mutex by
//! matching on the [`Gate`]; waiting happens outside the lock on two
//! [`Notify`] wakers.
//!
//! ```text
//!   send ──► try_push ──► Gate::Open(cap) + room ──► push_back ──► items.notify_one()
//!                    ├──► Gate::Open(cap) full  ──► wait on `space`
//!                    └──► Gate::Closed          ──► Err(Closed(item))
//!
//!   recv ──► try_pop  ──► buffered item         ──► pop_front ──► space.notify_one()
//!                    ├──► empty + Open          ──► wait on `items`
//!                    └──► empty + Closed        ──► end-of-stream
//! ```
//!
//! ## Rules
//! - Waiters register (`Notified::enable`) **before** inspecting state, so a
//!   close or push between the check and the await is never missed.
//! - `close` is idempotent internally; the public API makes a second close
//!   unrepresentable.
//! - Item removal happens synchronously in `try_pop`, so a cancelled `recv`
//!   never loses an item.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::error::{SendError, TryRecvError, TrySendError};

/// Buffer size of a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capacity {
    /// At most `n` buffered items; senders suspend when full. `0` is treated as `1`.
    Bounded(usize),
    /// Senders never suspend.
    Unbounded,
}

impl Capacity {
    #[inline]
    fn admits(self, len: usize) -> bool {
        match self {
            Capacity::Bounded(n) => len < n.max(1),
            Capacity::Unbounded => true,
        }
    }
}

impl From<usize> for Capacity {
    fn from(n: usize) -> Self {
        Capacity::Bounded(n)
    }
}

/// Open/closed tag; the only state transition is `Open -> Closed`.
#[derive(Clone, Copy, Debug)]
enum Gate {
    Open(Capacity),
    Closed,
}

struct State<T> {
    gate: Gate,
    buf: VecDeque<T>,
    receiver_alive: bool,
}

pub(crate) struct Channel<T> {
    state: Mutex<State<T>>,
    items: Notify,
    space: Notify,
}

impl<T> Channel<T> {
    pub(crate) fn new(capacity: Capacity) -> Self {
        let buf = match capacity {
            Capacity::Bounded(n) => VecDeque::with_capacity(n.clamp(1, 1024)),
            Capacity::Unbounded => VecDeque::new(),
        };
        Self {
            state: Mutex::new(State {
                gate: Gate::Open(capacity),
                buf,
                receiver_alive: true,
            }),
            items: Notify::new(),
            space: Notify::new(),
        }
    }

    /// No user code runs under this lock, so a poisoned guard still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn try_push(&self, item: T) -> Result<(), TrySendError<T>> {
        let mut state = self.lock();
        let capacity = match state.gate {
            Gate::Closed => return Err(TrySendError::Closed(item)),
            Gate::Open(capacity) => capacity,
        };
        if !state.receiver_alive {
            return Err(TrySendError::Disconnected(item));
        }
        if !capacity.admits(state.buf.len()) {
            return Err(TrySendError::Full(item));
        }
        state.buf.push_back(item);
        drop(state);
        self.items.notify_one();
        Ok(())
    }

    pub(crate) async fn push(&self, mut item: T) -> Result<(), SendError<T>> {
        loop {
            let space = self.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            match self.try_push(item) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(back)) => item = back,
                Err(TrySendError::Closed(back)) => return Err(SendError::Closed(back)),
                Err(TrySendError::Disconnected(back)) => {
                    return Err(SendError::Disconnected(back));
                }
            }
            space.await;
        }
    }

    pub(crate) fn try_pop(&self) -> Result<T, TryRecvError> {
        let mut state = self.lock();
        if let Some(item) = state.buf.pop_front() {
            drop(state);
            self.space.notify_one();
            return Ok(item);
        }
        match state.gate {
            Gate::Closed => Err(TryRecvError::Closed),
            Gate::Open(_) => Err(TryRecvError::Empty),
        }
    }

    pub(crate) async fn pop(&self) -> Option<T> {
        loop {
            let items = self.items.notified();
            tokio::pin!(items);
            items.as_mut().enable();

            match self.try_pop() {
                Ok(item) => return Some(item),
                Err(TryRecvError::Closed) => return None,
                Err(TryRecvError::Empty) => {}
            }
            items.await;
        }
    }

    /// Flips the gate to `Closed`. Returns `false` if it was already closed.
    pub(crate) fn close(&self) -> bool {
        let mut state = self.lock();
        if matches!(state.gate, Gate::Closed) {
            return false;
        }
        state.gate = Gate::Closed;
        drop(state);
        self.items.notify_waiters();
        self.space.notify_waiters();
        true
    }

    pub(crate) fn detach_receiver(&self) {
        let mut state = self.lock();
        state.receiver_alive = false;
        drop(state);
        self.space.notify_waiters();
    }

    pub(crate) fn is_disconnected(&self) -> bool {
        !self.lock().receiver_alive
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(self.lock().gate, Gate::Closed)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().buf.len()
    }
}
