//! Builder for constructing state machines.
//!
//! Building happens in two phases. Phase one records declarations by name:
//! ordinary states through [`MachineBuilder::state`] and diversions through
//! [`interrupt`](MachineBuilder::interrupt),
//! [`reset_interrupt`](MachineBuilder::reset_interrupt) and
//! [`holding`](MachineBuilder::holding). Phase two, [`MachineBuilder::build`],
//! validates every reference, lays out the state arena, synthesizes the
//! diversions and injects their triggers into every ordinary state.

use crate::builder::diversion::DiversionRequest;
use crate::builder::error::BuildError;
use crate::builder::state::{StateBuilder, StateDecl};
use crate::core::{
    render, Diversion, MachineRegistry, PrecedenceConflict, State, StateId, StateInfo, StateKind,
    StateName, Trigger,
};
use crate::engine::{EngineConfig, StateEngine, StateObserver, TransitionLogger};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stillwater::{NonEmptyVec, Validation};
use tracing::{debug, warn};

/// Builder for constructing state machines with a fluent API.
pub struct MachineBuilder<T: Trigger, N: StateName> {
    name: Option<String>,
    config: EngineConfig,
    decls: Vec<StateDecl<T, N>>,
    observers: Vec<Arc<dyn StateObserver<T, N>>>,
}

impl<T: Trigger, N: StateName> MachineBuilder<T, N> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            name: None,
            config: EngineConfig::default(),
            decls: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Name the machine. Shows up in logs and the registry.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Subscribe an observer as soon as the engine exists.
    pub fn observe(mut self, observer: Arc<dyn StateObserver<T, N>>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Declare an ordinary state.
    pub fn state(self, name: N) -> StateBuilder<T, N> {
        StateBuilder::new(self, StateDecl::new(name, None))
    }

    /// Declare an interrupt: reachable from every ordinary state through
    /// `trigger`, it runs its enter hook and returns to the state it
    /// interrupted.
    pub fn interrupt(self, name: N, trigger: T) -> StateBuilder<T, N> {
        StateBuilder::new(
            self,
            StateDecl::new(name, Some(DiversionRequest::interrupt(trigger))),
        )
    }

    /// Declare a reset interrupt: like [`interrupt`](Self::interrupt) but it
    /// always returns to `target`.
    pub fn reset_interrupt(self, name: N, trigger: T, target: N) -> StateBuilder<T, N> {
        StateBuilder::new(
            self,
            StateDecl::new(name, Some(DiversionRequest::reset(trigger, target))),
        )
    }

    /// Declare a holding state: entered through `trigger`, it stays current
    /// and ignores everything until `return_trigger` sends the machine back
    /// where it came from.
    pub fn holding(self, name: N, trigger: T, return_trigger: T) -> StateBuilder<T, N> {
        StateBuilder::new(
            self,
            StateDecl::new(name, Some(DiversionRequest::holding(trigger, return_trigger))),
        )
        .ignoring()
    }

    pub(crate) fn push(&mut self, decl: StateDecl<T, N>) {
        self.decls.push(decl);
    }

    /// Validate, resolve and instantiate the machine, starting in `start`.
    ///
    /// Every problem found is reported: one as itself, several as
    /// [`BuildError::Invalid`].
    pub fn build(self, start: N) -> Result<StateEngine<T, N>, BuildError> {
        validate(&self.decls, &start)
            .into_result()
            .map_err(|errors| {
                if errors.len() == 1 {
                    errors.head().clone()
                } else {
                    BuildError::Invalid(errors.into_vec())
                }
            })?;

        let MachineBuilder {
            name,
            config,
            decls,
            observers,
        } = self;

        // Ordinary states first, diversions after, each in declaration order.
        let (ordinary, diversions): (Vec<_>, Vec<_>) =
            decls.into_iter().partition(|decl| !decl.is_diversion());
        let decls: Vec<StateDecl<T, N>> = ordinary.into_iter().chain(diversions).collect();
        let ordinary_count = decls.iter().filter(|decl| !decl.is_diversion()).count();

        let ids: HashMap<N, StateId> = decls
            .iter()
            .enumerate()
            .map(|(i, decl)| (decl.name.clone(), StateId(i)))
            .collect();
        let resolve = |name: &N| ids.get(name).copied();

        let mut states = Vec::with_capacity(decls.len());
        let mut infos = Vec::with_capacity(decls.len());
        for decl in decls {
            let (state, info) = resolve_decl(decl, &resolve)?;
            states.push(state);
            infos.push(info);
        }

        let conflicts = inject_diversions(&mut states, &mut infos, ordinary_count);

        let start_id = resolve(&start).ok_or_else(|| BuildError::UndeclaredState {
            state: "start".to_string(),
            target: render(&start),
        })?;
        debug!(
            machine = name.as_deref().unwrap_or("no_name"),
            states = states.len(),
            conflicts = conflicts.len(),
            "machine built"
        );

        let logger = config
            .trace_transitions
            .then(|| TransitionLogger::new(name.as_deref()));
        let registry = MachineRegistry::new(name, start, infos, conflicts);
        let mut engine = StateEngine::new(states, start_id, config, registry);
        if let Some(logger) = logger {
            engine.subscribe(Arc::new(logger));
        }
        for observer in observers {
            engine.subscribe(observer);
        }
        Ok(engine)
    }
}

impl<T: Trigger, N: StateName> Default for MachineBuilder<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

type Check = Validation<(), NonEmptyVec<BuildError>>;

fn validate<T: Trigger, N: StateName>(decls: &[StateDecl<T, N>], start: &N) -> Check {
    let kinds: HashMap<&N, bool> = decls
        .iter()
        .map(|decl| (&decl.name, decl.is_diversion()))
        .collect();
    let mut checks: Vec<Check> = Vec::new();

    let mut seen = HashSet::new();
    for decl in decls {
        if !seen.insert(&decl.name) {
            checks.push(Validation::fail(BuildError::DuplicateState(render(&decl.name))));
        }
        checks.extend(decl.problems.iter().cloned().map(Validation::fail));
        for target in decl.references() {
            if !kinds.contains_key(target) {
                checks.push(Validation::fail(BuildError::UndeclaredState {
                    state: render(&decl.name),
                    target: render(target),
                }));
            }
        }
        if let Some(target) = decl.diversion.as_ref().and_then(|d| d.reset_target()) {
            if kinds.get(target) == Some(&true) {
                checks.push(Validation::fail(BuildError::DiversionTarget {
                    state: render(&decl.name),
                    target: render(target),
                }));
            }
        }
    }

    match kinds.get(start) {
        None => checks.push(Validation::fail(BuildError::UndeclaredState {
            state: "start".to_string(),
            target: render(start),
        })),
        Some(true) => checks.push(Validation::fail(BuildError::DiversionStart(render(start)))),
        Some(false) => {}
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Turn a validated declaration into its runtime state and registry entry.
fn resolve_decl<T: Trigger, N: StateName>(
    decl: StateDecl<T, N>,
    resolve: &impl Fn(&N) -> Option<StateId>,
) -> Result<(State<T, N>, StateInfo<T, N>), BuildError> {
    let undeclared = |target: &N| BuildError::UndeclaredState {
        state: render(&decl.name),
        target: render(target),
    };

    let mut state = State::new(decl.name.clone());
    for (trigger, target) in &decl.transitions {
        let id = resolve(target).ok_or_else(|| undeclared(target))?;
        state.transitions.insert(trigger.clone(), id);
    }
    state.fallback = decl
        .fallback
        .as_ref()
        .map(|target| resolve(target).ok_or_else(|| undeclared(target)))
        .transpose()?;
    state.ignoring = decl.ignoring;
    state.veto = decl.veto;
    state.on_enter = decl.on_enter;
    state.on_exit = decl.on_exit;

    let kind = match decl.diversion {
        Some(request) => {
            let policy = request
                .policy(resolve)
                .ok_or_else(|| match request.reset_target() {
                    Some(target) => undeclared(target),
                    None => undeclared(&decl.name),
                })?;
            state.diversion = Some(Diversion::new(request.trigger.clone(), policy));
            request.kind
        }
        None => StateKind::Ordinary,
    };

    let info = StateInfo {
        name: decl.name,
        kind,
        ignoring: state.ignoring,
        transitions: decl.transitions,
        fallback: decl.fallback,
    };
    Ok((state, info))
}

/// Insert every diversion trigger into every ordinary state without
/// overwriting. Explicit transitions win; each collision is reported.
fn inject_diversions<T: Trigger, N: StateName>(
    states: &mut [State<T, N>],
    infos: &mut [StateInfo<T, N>],
    ordinary_count: usize,
) -> Vec<PrecedenceConflict<T, N>> {
    let (ordinary, diversions) = states.split_at_mut(ordinary_count);
    let mut conflicts = Vec::new();

    for (offset, diversion_state) in diversions.iter().enumerate() {
        let Some(diversion) = diversion_state.diversion() else {
            continue;
        };
        let diversion_id = StateId(ordinary_count + offset);
        let trigger = diversion.trigger();

        for (index, state) in ordinary.iter_mut().enumerate() {
            match state.insert_if_absent(trigger.clone(), diversion_id) {
                None => infos[index]
                    .transitions
                    .push((trigger.clone(), diversion_state.name().clone())),
                Some(existing) => {
                    let explicit_target = if existing.index() < ordinary_count {
                        infos[existing.index()].name.clone()
                    } else {
                        diversions[existing.index() - ordinary_count].name().clone()
                    };
                    warn!(
                        state = ?state.name(),
                        ?trigger,
                        explicit = ?explicit_target,
                        diversion = ?diversion_state.name(),
                        "diversion trigger shadowed by existing transition"
                    );
                    conflicts.push(PrecedenceConflict {
                        state: state.name().clone(),
                        trigger: trigger.clone(),
                        explicit_target,
                        diversion: diversion_state.name().clone(),
                    });
                }
            }
        }
    }
    conflicts
}
