//! Engine configuration.

/// Upper bound on transitions executed by one submission, cascades included.
pub const DEFAULT_CASCADE_LIMIT: usize = 10_000;

/// Tuning knobs for a [`StateEngine`](crate::engine::StateEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum transitions one submission may execute before it fails with
    /// [`EngineError::CascadeLimitExceeded`](crate::engine::EngineError).
    pub cascade_limit: usize,
    /// Subscribe a [`TransitionLogger`](crate::engine::TransitionLogger) at build time.
    pub trace_transitions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cascade_limit: DEFAULT_CASCADE_LIMIT,
            trace_transitions: false,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cascade_limit(mut self, limit: usize) -> Self {
        self.cascade_limit = limit.max(1);
        self
    }

    pub fn trace_transitions(mut self, enabled: bool) -> Self {
        self.trace_transitions = enabled;
        self
    }
}
