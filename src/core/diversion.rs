//! Diversion states: temporary digressions reachable from every ordinary state.
//!
//! All three flavours share one type. They differ only in what happens once
//! the diversion has been entered:
//!
//! - [`CompletionPolicy::ReturnToCapturedPrevious`]: run the hook, then restore
//!   the state the machine came from (an interrupt).
//! - [`CompletionPolicy::ReturnToFixedTarget`]: run the hook, then restore a
//!   state chosen at build time (a reset interrupt).
//! - [`CompletionPolicy::HoldUntilTrigger`]: stay put until the return
//!   trigger arrives, then go back to the state the machine came from.
//!
//! Only one return slot exists per diversion. Re-entering a holding
//! diversion overwrites the slot with the new previous state.

use super::state::StateId;
use super::label::Trigger;

/// What a diversion does after its enter hook ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionPolicy<T> {
    /// Restore the state captured at activation.
    ReturnToCapturedPrevious,
    /// Restore a fixed state.
    ReturnToFixedTarget(StateId),
    /// Stay current; the given trigger leads back to the captured state.
    HoldUntilTrigger(T),
}

/// The diversion data attached to a synthesized state.
#[derive(Clone, Debug)]
pub struct Diversion<T: Trigger> {
    trigger: T,
    policy: CompletionPolicy<T>,
    captured: Option<StateId>,
}

impl<T: Trigger> Diversion<T> {
    pub(crate) fn new(trigger: T, policy: CompletionPolicy<T>) -> Self {
        Self {
            trigger,
            policy,
            captured: None,
        }
    }

    /// The trigger injected into every ordinary state.
    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn policy(&self) -> &CompletionPolicy<T> {
        &self.policy
    }

    /// The state captured at the last activation, if any.
    pub fn captured(&self) -> Option<StateId> {
        self.captured
    }

    /// Record the state the machine came from.
    ///
    /// A transition from the diversion onto itself keeps the earlier capture,
    /// otherwise a holding state would return to itself.
    pub(crate) fn capture(&mut self, own: StateId, previous: Option<StateId>) {
        if let Some(previous) = previous.filter(|p| *p != own) {
            self.captured = Some(previous);
        }
    }

    /// Where the engine must restore to once the enter hook finished.
    ///
    /// `Ok(None)` means the diversion stays current. `Err` carries the reason
    /// a captured-previous diversion cannot complete.
    pub(crate) fn completion(&self) -> Result<Option<StateId>, &'static str> {
        match &self.policy {
            CompletionPolicy::ReturnToCapturedPrevious => self
                .captured
                .map(Some)
                .ok_or("interrupt activated without a previous state"),
            CompletionPolicy::ReturnToFixedTarget(target) => Ok(Some(*target)),
            CompletionPolicy::HoldUntilTrigger(_) => Ok(None),
        }
    }

    /// The return transition a holding diversion installs on itself.
    pub(crate) fn hold_return(&self) -> Option<Result<(T, StateId), &'static str>> {
        match &self.policy {
            CompletionPolicy::HoldUntilTrigger(ret) => Some(
                self.captured
                    .map(|target| (ret.clone(), target))
                    .ok_or("holding state activated without a previous state"),
            ),
            _ => None,
        }
    }
}
