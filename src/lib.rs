//! Sidetrack: a finite-state-machine engine with diversions
//!
//! Sidetrack drives a graph of named states connected by trigger-keyed
//! transitions. Enter hooks can schedule follow-up triggers, which settle
//! before the submission that caused them returns. Three kinds of diversion
//! states can be synthesized at build time and are reachable from every
//! ordinary state.
//!
//! # Core Concepts
//!
//! - **States**: named nodes with a transition table, an optional catch-all,
//!   an `ignoring` flag, an exit veto, and sync or async enter/exit hooks
//! - **Diversions**: interrupts that return where they came from, reset
//!   interrupts that return to a fixed state, and holding states that wait
//!   for a return trigger
//! - **Engine**: executes one trigger at a time, cascades included
//! - **Guard**: serializes submissions from many threads without dropping any
//! - **Observers**: subscribe to state changes; a logger and a history
//!   recorder are provided
//!
//! # Example
//!
//! ```rust
//! use sidetrack::builder::MachineBuilder;
//! use sidetrack::label_enum;
//!
//! label_enum! {
//!     pub enum Player {
//!         Stopped,
//!         Playing,
//!         Buffering,
//!     }
//! }
//!
//! label_enum! {
//!     pub enum Input {
//!         Play,
//!         Stop,
//!         Stall,
//!     }
//! }
//!
//! let mut engine = MachineBuilder::new()
//!     .name("player")
//!     .state(Player::Stopped)
//!     .transition(Input::Play, Player::Playing)
//!     .done()
//!     .state(Player::Playing)
//!     .transition(Input::Stop, Player::Stopped)
//!     .done()
//!     .interrupt(Player::Buffering, Input::Stall)
//!     .done()
//!     .build(Player::Stopped)
//!     .unwrap();
//!
//! engine.submit(Input::Play).unwrap();
//!
//! // The interrupt runs and hands control straight back.
//! assert_eq!(engine.submit(Input::Stall).unwrap(), Some(Player::Playing));
//! assert_eq!(engine.previous_state(), Some(&Player::Buffering));
//! ```

pub mod builder;
pub mod concurrency;
pub mod core;
pub mod engine;
pub mod hooks;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, StateBuilder};
pub use concurrency::{ConcurrencyGuard, Snapshot};
pub use crate::core::{MachineRegistry, StateId, StateName, TransitionHistory, Trigger};
pub use engine::{EngineConfig, EngineError, StateEngine, StateObserver};
pub use hooks::{EnterContext, ExitContext, HookError};
