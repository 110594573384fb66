//! Execution engine.
//!
//! [`StateEngine`] owns the state arena and drives submissions, cascades
//! included. Observers subscribe to it through [`StateObserver`].

mod config;
mod error;
mod machine;
mod observer;

pub use config::{EngineConfig, DEFAULT_CASCADE_LIMIT};
pub use error::EngineError;
pub use machine::StateEngine;
pub use observer::{
    HistoryRecorder, ObserverRegistry, StateObserver, SubscriptionId, TransitionLogger,
};
