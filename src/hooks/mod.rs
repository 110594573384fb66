//! Enter and exit hooks.
//!
//! A hook is exactly one of synchronous, asynchronous or absent. Async hooks
//! are Stillwater effects whose environment is the hook context, so they
//! compose with the rest of the effect toolkit:
//!
//! - Build one with [`Hook::from_async`] from an async closure
//! - Or with [`Hook::effect`] from a factory returning a `BoxedEffect`
//!
//! Enter hooks receive an [`EnterContext`] carrying a [`Scheduler`] for
//! follow-up triggers; exit hooks receive an [`ExitContext`].

mod context;
mod hook;

pub use context::{EnterContext, ExitContext, Scheduler};
pub use hook::{AsyncHook, Hook, HookError, SyncHook};
