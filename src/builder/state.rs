//! Per-state declarations.

use crate::builder::diversion::DiversionRequest;
use crate::builder::error::BuildError;
use crate::builder::machine::MachineBuilder;
use crate::core::{render, ExitVeto, StateName, Trigger};
use crate::hooks::{EnterContext, ExitContext, Hook, HookError};
use std::future::Future;
use stillwater::effect::BoxedEffect;

/// Everything declared about one state, by name, before resolution.
pub(crate) struct StateDecl<T: Trigger, N: StateName> {
    pub(crate) name: N,
    pub(crate) diversion: Option<DiversionRequest<T, N>>,
    pub(crate) ignoring: bool,
    pub(crate) transitions: Vec<(T, N)>,
    pub(crate) fallback: Option<N>,
    pub(crate) on_enter: Hook<EnterContext<T, N>>,
    pub(crate) on_exit: Hook<ExitContext<T, N>>,
    pub(crate) veto: Option<ExitVeto<T>>,
    pub(crate) problems: Vec<BuildError>,
}

impl<T: Trigger, N: StateName> StateDecl<T, N> {
    pub(crate) fn new(name: N, diversion: Option<DiversionRequest<T, N>>) -> Self {
        Self {
            name,
            diversion,
            ignoring: false,
            transitions: Vec::new(),
            fallback: None,
            on_enter: Hook::Absent,
            on_exit: Hook::Absent,
            veto: None,
            problems: Vec::new(),
        }
    }

    pub(crate) fn is_diversion(&self) -> bool {
        self.diversion.is_some()
    }

    /// Every name this declaration points at, besides its own.
    pub(crate) fn references(&self) -> impl Iterator<Item = &N> {
        self.transitions
            .iter()
            .map(|(_, target)| target)
            .chain(self.fallback.iter())
            .chain(self.diversion.iter().filter_map(|d| d.reset_target()))
    }
}

/// Fluent declaration of one state. [`done`](StateBuilder::done) hands the
/// machine builder back.
///
/// Registering a hook twice replaces the first one; a hook is sync or async,
/// never both.
pub struct StateBuilder<T: Trigger, N: StateName> {
    machine: MachineBuilder<T, N>,
    decl: StateDecl<T, N>,
}

impl<T: Trigger, N: StateName> StateBuilder<T, N> {
    pub(crate) fn new(machine: MachineBuilder<T, N>, decl: StateDecl<T, N>) -> Self {
        Self { machine, decl }
    }

    /// Add a transition. Declaring the same trigger twice is a build error.
    pub fn transition(mut self, trigger: T, target: N) -> Self {
        if self.decl.transitions.iter().any(|(t, _)| *t == trigger) {
            self.decl.problems.push(BuildError::DuplicateTransition {
                state: render(&self.decl.name),
                trigger: render(&trigger),
            });
        } else {
            self.decl.transitions.push((trigger, target));
        }
        self
    }

    /// Transition onto this same state. Enter runs, exit does not.
    pub fn self_loop(self, trigger: T) -> Self {
        let own = self.decl.name.clone();
        self.transition(trigger, own)
    }

    /// Target for every trigger without an explicit transition.
    pub fn catch_all(mut self, target: N) -> Self {
        if self.decl.fallback.is_some() {
            self.decl
                .problems
                .push(BuildError::DuplicateCatchAll(render(&self.decl.name)));
        } else {
            self.decl.fallback = Some(target);
        }
        self
    }

    /// Unresolved triggers produce no transition instead of an error.
    pub fn ignoring(mut self) -> Self {
        self.decl.ignoring = true;
        self
    }

    /// Refuse to leave the state while the predicate answers `true`.
    pub fn veto_exit<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.decl.veto = Some(ExitVeto::new(predicate));
        self
    }

    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EnterContext<T, N>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.decl.on_enter = Hook::sync(hook);
        self
    }

    pub fn on_enter_async<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(EnterContext<T, N>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.decl.on_enter = Hook::from_async(hook);
        self
    }

    /// Enter hook built from a Stillwater effect factory. The effect's
    /// environment is the [`EnterContext`].
    pub fn on_enter_effect<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> BoxedEffect<(), HookError, EnterContext<T, N>> + Send + Sync + 'static,
    {
        self.decl.on_enter = Hook::effect(factory);
        self
    }

    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ExitContext<T, N>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.decl.on_exit = Hook::sync(hook);
        self
    }

    pub fn on_exit_async<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ExitContext<T, N>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.decl.on_exit = Hook::from_async(hook);
        self
    }

    pub fn on_exit_effect<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> BoxedEffect<(), HookError, ExitContext<T, N>> + Send + Sync + 'static,
    {
        self.decl.on_exit = Hook::effect(factory);
        self
    }

    /// Finish this state and return to the machine builder.
    pub fn done(self) -> MachineBuilder<T, N> {
        let mut machine = self.machine;
        machine.push(self.decl);
        machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &'static str) -> StateBuilder<&'static str, &'static str> {
        StateBuilder::new(MachineBuilder::new(), StateDecl::new(name, None))
    }

    #[test]
    fn duplicate_trigger_is_recorded_not_overwritten() {
        let builder = decl("A").transition("go", "B").transition("go", "C");

        assert_eq!(builder.decl.transitions, vec![("go", "B")]);
        assert!(matches!(
            builder.decl.problems.as_slice(),
            [BuildError::DuplicateTransition { .. }]
        ));
    }

    #[test]
    fn second_catch_all_is_recorded() {
        let builder = decl("A").catch_all("B").catch_all("C");

        assert_eq!(builder.decl.fallback, Some("B"));
        assert_eq!(
            builder.decl.problems,
            vec![BuildError::DuplicateCatchAll("A".to_string())]
        );
    }

    #[test]
    fn self_loop_targets_own_name() {
        let builder = decl("Spin").self_loop("tick");
        assert_eq!(builder.decl.transitions, vec![("tick", "Spin")]);
    }

    #[test]
    fn re_registering_a_hook_replaces_it() {
        let builder = decl("A")
            .on_enter(|_| Ok(()))
            .on_enter_async(|_| async { Ok(()) });

        assert!(builder.decl.on_enter.is_async());
        assert!(builder.decl.on_exit.is_absent());
    }

    #[test]
    fn references_cover_targets_fallback_and_reset() {
        let reset = StateDecl::new("Reset", Some(DiversionRequest::reset("panic", "Home")));
        assert_eq!(reset.references().collect::<Vec<_>>(), vec![&"Home"]);

        let builder = decl("A").transition("go", "B").catch_all("C");
        assert_eq!(
            builder.decl.references().collect::<Vec<_>>(),
            vec![&"B", &"C"]
        );
    }
}
