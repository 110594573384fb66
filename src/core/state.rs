//! State nodes and their transition tables.
//!
//! A [`State`] owns everything needed to leave it: the trigger-keyed
//! transition table, an optional catch-all fallback, the `ignoring` flag and
//! an optional exit veto. It also owns its enter and exit hooks. States refer
//! to each other through [`StateId`] indices into the engine's arena.

use super::diversion::Diversion;
use super::guard::ExitVeto;
use super::label::{render, StateName, Trigger};
use crate::engine::EngineError;
use crate::hooks::{EnterContext, ExitContext, Hook};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a state inside one engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A node of the state graph.
pub struct State<T: Trigger, N: StateName> {
    pub(crate) name: N,
    pub(crate) transitions: HashMap<T, StateId>,
    pub(crate) fallback: Option<StateId>,
    pub(crate) ignoring: bool,
    pub(crate) on_enter: Hook<EnterContext<T, N>>,
    pub(crate) on_exit: Hook<ExitContext<T, N>>,
    pub(crate) veto: Option<ExitVeto<T>>,
    pub(crate) diversion: Option<Diversion<T>>,
}

impl<T: Trigger, N: StateName> State<T, N> {
    pub(crate) fn new(name: N) -> Self {
        Self {
            name,
            transitions: HashMap::new(),
            fallback: None,
            ignoring: false,
            on_enter: Hook::Absent,
            on_exit: Hook::Absent,
            veto: None,
            diversion: None,
        }
    }

    pub fn name(&self) -> &N {
        &self.name
    }

    pub fn is_ignoring(&self) -> bool {
        self.ignoring
    }

    pub fn is_diversion(&self) -> bool {
        self.diversion.is_some()
    }

    pub fn diversion(&self) -> Option<&Diversion<T>> {
        self.diversion.as_ref()
    }

    /// The explicit target for a trigger, ignoring fallback and veto.
    pub fn transition(&self, trigger: &T) -> Option<StateId> {
        self.transitions.get(trigger).copied()
    }

    pub fn fallback(&self) -> Option<StateId> {
        self.fallback
    }

    /// Add a transition unless one already exists for the trigger.
    ///
    /// Returns the existing target when the insert was refused.
    pub(crate) fn insert_if_absent(&mut self, trigger: T, target: StateId) -> Option<StateId> {
        match self.transitions.get(&trigger) {
            Some(existing) => Some(*existing),
            None => {
                self.transitions.insert(trigger, target);
                None
            }
        }
    }

    /// Resolve the state a trigger leads to.
    ///
    /// Order: exit veto, explicit transition, catch-all, ignoring. A state
    /// that is not ignoring and has no path fails with
    /// [`EngineError::TransitionNotFound`].
    pub fn next(&self, trigger: &T) -> Result<Option<StateId>, EngineError> {
        if self.veto.as_ref().is_some_and(|veto| veto.vetoes(trigger)) {
            return Ok(None);
        }

        if let Some(target) = self.transitions.get(trigger) {
            return Ok(Some(*target));
        }

        if let Some(target) = self.fallback {
            return Ok(Some(target));
        }

        if self.ignoring {
            return Ok(None);
        }

        Err(EngineError::TransitionNotFound {
            state: render(&self.name),
            trigger: render(&trigger),
        })
    }

    /// Diversion bookkeeping when this state becomes current.
    ///
    /// Captures the previous state and, for a holding diversion, re-installs
    /// the return transition over any one left by an earlier activation.
    pub(crate) fn activate(
        &mut self,
        own: StateId,
        previous: Option<StateId>,
    ) -> Result<(), EngineError> {
        let Some(diversion) = self.diversion.as_mut() else {
            return Ok(());
        };
        diversion.capture(own, previous);

        if let Some(hold) = diversion.hold_return() {
            let (trigger, target) = hold.map_err(|reason| EngineError::HookContractViolation {
                state: render(&self.name),
                reason: reason.to_string(),
            })?;
            self.transitions.insert(trigger, target);
        }
        Ok(())
    }
}
