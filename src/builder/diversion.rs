//! Diversion requests recorded during phase one of a build.

use crate::core::{CompletionPolicy, StateId, StateKind, StateName, Trigger};

/// A diversion the builder must synthesize: its injected trigger and flavour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DiversionRequest<T, N> {
    pub(crate) trigger: T,
    pub(crate) kind: StateKind<T, N>,
}

impl<T: Trigger, N: StateName> DiversionRequest<T, N> {
    pub(crate) fn interrupt(trigger: T) -> Self {
        Self {
            trigger,
            kind: StateKind::Interrupt,
        }
    }

    pub(crate) fn reset(trigger: T, target: N) -> Self {
        Self {
            trigger,
            kind: StateKind::ResetInterrupt { target },
        }
    }

    pub(crate) fn holding(trigger: T, return_trigger: T) -> Self {
        Self {
            trigger,
            kind: StateKind::Holding { return_trigger },
        }
    }

    /// The fixed state a reset interrupt returns to.
    pub(crate) fn reset_target(&self) -> Option<&N> {
        match &self.kind {
            StateKind::ResetInterrupt { target } => Some(target),
            _ => None,
        }
    }

    /// Resolve names into the runtime policy. `None` when a reset target is
    /// not in the arena, which validation rules out beforehand.
    pub(crate) fn policy(
        &self,
        resolve: impl Fn(&N) -> Option<StateId>,
    ) -> Option<CompletionPolicy<T>> {
        match &self.kind {
            StateKind::Ordinary | StateKind::Interrupt => {
                Some(CompletionPolicy::ReturnToCapturedPrevious)
            }
            StateKind::ResetInterrupt { target } => {
                resolve(target).map(CompletionPolicy::ReturnToFixedTarget)
            }
            StateKind::Holding { return_trigger } => {
                Some(CompletionPolicy::HoldUntilTrigger(return_trigger.clone()))
            }
        }
    }
}
