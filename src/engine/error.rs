//! Engine error types.

use crate::hooks::HookError;
use thiserror::Error;

/// Errors raised while processing a submission.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No transition, catch-all or ignoring rule applies.
    #[error("No transition for trigger {trigger} from state {state}")]
    TransitionNotFound { state: String, trigger: String },

    #[error("Hook of state {state} failed: {source}")]
    HookFailed {
        state: String,
        #[source]
        source: HookError,
    },

    /// A diversion was activated without the state it must return to.
    #[error("Diversion {state} violated its hook contract: {reason}")]
    HookContractViolation { state: String, reason: String },

    #[error("Cascade exceeded {limit} transitions in a single submission")]
    CascadeLimitExceeded { limit: usize },

    #[error("Unknown state {0}")]
    UnknownState(String),
}

impl EngineError {
    pub fn is_transition_not_found(&self) -> bool {
        matches!(self, EngineError::TransitionNotFound { .. })
    }
}
