//! Kernel core: entry point, configuration and lifecycle.
//!
//! The public API from this module is [`Kernel`], its [`KernelBuilder`] and
//! [`KernelConfig`], plus the two free shutdown helpers.
//!
//! Internal modules:
//! - [`runner`]: contained execution of caller code and fault reporting;
//! - [`lifecycle`]: two-phase shutdown (close, then wait), optionally grace-bounded;
//! - [`kernel`]: owns the bus and subscribers, starts every task shape.

mod builder;
mod config;
mod kernel;
pub(crate) mod lifecycle;
pub(crate) mod runner;

pub use builder::KernelBuilder;
pub use config::KernelConfig;
pub use kernel::Kernel;
pub use lifecycle::{close_all_and_wait, close_and_wait};
