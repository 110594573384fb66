//! Immutable post-build snapshot of a machine's graph.
//!
//! The registry is what external tooling (renderers, diagnostics) consumes.
//! It is taken once the builder has resolved every name and injected every
//! diversion, and never changes afterwards, even though a holding diversion
//! re-installs its return transition inside the live engine.

use serde::{Deserialize, Serialize};

/// The flavour of a state as declared to the builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateKind<T, N> {
    Ordinary,
    Interrupt,
    ResetInterrupt { target: N },
    Holding { return_trigger: T },
}

/// Description of one state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateInfo<T, N> {
    pub name: N,
    pub kind: StateKind<T, N>,
    pub ignoring: bool,
    /// Explicit transitions in declaration order, then injected diversions.
    pub transitions: Vec<(T, N)>,
    pub fallback: Option<N>,
}

impl<T, N> StateInfo<T, N> {
    pub fn is_diversion(&self) -> bool {
        !matches!(self.kind, StateKind::Ordinary)
    }
}

/// A diversion trigger that could not be injected into a state because the
/// state already had an explicit transition for it. The explicit one wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrecedenceConflict<T, N> {
    pub state: N,
    pub trigger: T,
    pub explicit_target: N,
    pub diversion: N,
}

/// Snapshot of every state, the start state and the machine name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MachineRegistry<T, N> {
    name: Option<String>,
    start: N,
    states: Vec<StateInfo<T, N>>,
    conflicts: Vec<PrecedenceConflict<T, N>>,
}

impl<T, N: PartialEq> MachineRegistry<T, N> {
    pub(crate) fn new(
        name: Option<String>,
        start: N,
        states: Vec<StateInfo<T, N>>,
        conflicts: Vec<PrecedenceConflict<T, N>>,
    ) -> Self {
        Self {
            name,
            start,
            states,
            conflicts,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn start_state(&self) -> &N {
        &self.start
    }

    /// Ordinary states in declaration order, followed by diversions.
    pub fn states(&self) -> &[StateInfo<T, N>] {
        &self.states
    }

    pub fn state(&self, name: &N) -> Option<&StateInfo<T, N>> {
        self.states.iter().find(|info| &info.name == name)
    }

    pub fn ordinary_states(&self) -> impl Iterator<Item = &StateInfo<T, N>> {
        self.states.iter().filter(|info| !info.is_diversion())
    }

    pub fn diversions(&self) -> impl Iterator<Item = &StateInfo<T, N>> {
        self.states.iter().filter(|info| info.is_diversion())
    }

    pub fn conflicts(&self) -> &[PrecedenceConflict<T, N>] {
        &self.conflicts
    }
}

impl<T: Serialize, N: Serialize> MachineRegistry<T, N> {
    /// Export the snapshot for out-of-process tooling.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
