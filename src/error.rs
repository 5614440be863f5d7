//! Error types used by the taskline kernel.
//!
//! - [`RuntimeError`]: failures of the kernel's own lifecycle (a shutdown that outlived its grace).
//! - [`Fault`]: a contained panic from caller-supplied code; processing continues.
//! - [`ItemFault`]: a [`Fault`] together with the work item that caused it.
//!
//! Queue errors live next to the queue ([`SendError`](crate::SendError) and friends).

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the kernel runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Tasks did not observe end-of-stream within the configured grace period.
    #[error("shutdown grace {grace:?} exceeded; {running} task(s) still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of tasks that had not exited yet.
        running: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskline::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), running: 2 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, running } => {
                format!("grace exceeded after {grace:?}; running tasks={running}")
            }
        }
    }
}

/// # A contained panic.
///
/// Produced whenever a handler, transform, consumer or timed computation panics.
/// The panic never escapes the task that ran the code; it is turned into this value
/// and reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handler panicked: {message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    /// Creates a fault with an explicit message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Builds a fault from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Self { message }
    }

    /// Builds a fault from a failed join of a spawned computation.
    pub(crate) fn from_join(err: tokio::task::JoinError) -> Self {
        match err.try_into_panic() {
            Ok(payload) => Self::from_panic(payload),
            Err(err) => Self::new(err.to_string()),
        }
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "handler_fault"
    }
}

/// A [`Fault`] together with the input that triggered it.
///
/// Handed to the mapper's fault handler so the caller can recover or re-enqueue.
#[derive(Debug, Clone)]
pub struct ItemFault<T> {
    /// The work item whose processing panicked.
    pub item: T,
    /// The contained panic.
    pub fault: Fault,
}
