//! Core state graph types.
//!
//! This module contains the data the engine runs on:
//! - Label traits for triggers and state names
//! - State nodes with their transition tables and exit vetoes
//! - Diversion policies for synthesized states
//! - Transition history and the post-build registry snapshot

mod diversion;
mod guard;
mod history;
mod label;
mod registry;
mod state;

pub use diversion::{CompletionPolicy, Diversion};
pub use guard::ExitVeto;
pub use history::{TransitionHistory, TransitionRecord};
pub(crate) use label::render;
pub use label::{StateName, Trigger};
pub use registry::{MachineRegistry, PrecedenceConflict, StateInfo, StateKind};
pub use state::{State, StateId};
