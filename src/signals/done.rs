//! # One-shot completion signal.
//!
//! A completion signal is a dedicated `()` queue on which nothing is ever sent.
//! The task owns the [`Completion`] (the queue's producer) and closes it right
//! before it exits; the caller owns [`Done`] (the receiver) and waits for
//! end-of-stream.
//!
//! Because a dropped producer closes its queue, the signal fires exactly once even
//! if the task is torn down by runtime shutdown instead of reaching its last line.

use crate::queue::{queue, Capacity, Producer, Receiver};

/// Task-side half of a completion signal.
pub(crate) struct Completion {
    signal: Producer<()>,
}

impl Completion {
    /// Fires the signal.
    pub(crate) fn complete(self) {
        self.signal.close();
    }
}

/// Caller-side half of a completion signal.
#[derive(Debug)]
pub struct Done {
    signal: Receiver<()>,
}

impl Done {
    /// Waits until the task has exited. Returns immediately on every later call.
    pub async fn wait(&mut self) {
        while self.signal.recv().await.is_some() {}
    }

    /// True once the task has exited.
    pub fn is_done(&self) -> bool {
        self.signal.is_closed()
    }
}

/// Creates a linked `(Completion, Done)` pair.
pub(crate) fn completion() -> (Completion, Done) {
    let (signal, rx) = queue::<()>(Capacity::Bounded(1));
    (Completion { signal }, Done { signal: rx })
}
