//! Build errors for machines and their states.

use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("State {state} references undeclared state {target}")]
    UndeclaredState { state: String, target: String },

    #[error("State {0} declared more than once")]
    DuplicateState(String),

    #[error("State {state} declares trigger {trigger} more than once")]
    DuplicateTransition { state: String, trigger: String },

    #[error("State {0} declares more than one catch-all")]
    DuplicateCatchAll(String),

    #[error("Start state {0} is a diversion. Start from an ordinary state")]
    DiversionStart(String),

    #[error("Reset interrupt {state} returns to {target}, which is itself a diversion")]
    DiversionTarget { state: String, target: String },

    #[error("{} problems found: {}", .0.len(), render(.0))]
    Invalid(Vec<BuildError>),
}

impl BuildError {
    /// Every individual problem, flattening [`BuildError::Invalid`].
    pub fn problems(&self) -> Vec<&BuildError> {
        match self {
            BuildError::Invalid(errors) => errors.iter().flat_map(|e| e.problems()).collect(),
            single => vec![single],
        }
    }
}

fn render(errors: &[BuildError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
