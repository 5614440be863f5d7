//! # Task shapes started by the kernel.
//!
//! - [`worker`]: one task per input queue; single workers and fixed-size pools
//! - [`pipeline`]: generate ─► transform (fan-out) ─► consume (fan-in)
//! - [`mapper`]: per-item mapping from one queue to another with fault containment
//!
//! All three share one loop shape: receive until end-of-stream, run the
//! caller's code contained, report faults, keep going.

pub(crate) mod mapper;
pub(crate) mod pipeline;
pub(crate) mod worker;

pub use pipeline::{BatchReport, BatchSpec};
