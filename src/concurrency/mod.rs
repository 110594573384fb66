//! Concurrent submission.
//!
//! A bare [`StateEngine`](crate::engine::StateEngine) needs `&mut self`.
//! [`ConcurrencyGuard`] accepts triggers from any number of threads or tasks
//! and applies them one at a time, in arrival order.

mod guard;

pub use guard::{ConcurrencyGuard, Snapshot};
