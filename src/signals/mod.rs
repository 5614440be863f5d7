//! Exit signals for tasks: a one-shot [`Done`] per task and a [`Counter`] per pool.

mod counter;
mod done;

pub use counter::Counter;
pub use done::Done;

pub(crate) use done::completion;
