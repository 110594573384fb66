//! The state engine: drives one machine instance.
//!
//! A submission resolves the current state's next state, runs the exit hook
//! (skipped on self-loops), moves current/previous, notifies observers, runs
//! the enter hook and then drains whatever the enter hook scheduled. Draining
//! is depth first: a scheduled trigger's own follow-ups settle before the
//! next sibling starts.

use super::config::EngineConfig;
use super::error::EngineError;
use super::observer::{ObserverRegistry, StateObserver, SubscriptionId};
use crate::core::{render, MachineRegistry, State, StateId, StateName, Trigger};
use crate::hooks::{EnterContext, ExitContext, Scheduler};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A built state machine.
///
/// The engine is single-threaded by contract: every mutating operation takes
/// `&mut self`. Wrap it in a [`ConcurrencyGuard`](crate::concurrency::ConcurrencyGuard)
/// to accept submissions from several threads.
///
/// # Example
///
/// ```rust
/// use sidetrack::builder::MachineBuilder;
///
/// let mut engine = MachineBuilder::new()
///     .state("Idle").transition("start", "Running").done()
///     .state("Running").transition("stop", "Idle").done()
///     .build("Idle")
///     .unwrap();
///
/// assert_eq!(engine.submit("start").unwrap(), Some("Running"));
/// assert_eq!(engine.previous_state(), Some(&"Idle"));
/// ```
pub struct StateEngine<T: Trigger, N: StateName> {
    states: Vec<State<T, N>>,
    index: HashMap<N, StateId>,
    current: StateId,
    previous: Option<StateId>,
    observers: ObserverRegistry<T, N>,
    config: EngineConfig,
    registry: Arc<MachineRegistry<T, N>>,
}

impl<T: Trigger, N: StateName> StateEngine<T, N> {
    pub(crate) fn new(
        states: Vec<State<T, N>>,
        start: StateId,
        config: EngineConfig,
        registry: MachineRegistry<T, N>,
    ) -> Self {
        let index = states
            .iter()
            .enumerate()
            .map(|(i, state)| (state.name.clone(), StateId(i)))
            .collect();
        Self {
            states,
            index,
            current: start,
            previous: None,
            observers: ObserverRegistry::new(),
            config,
            registry: Arc::new(registry),
        }
    }

    pub fn current_state(&self) -> &N {
        &self.states[self.current.0].name
    }

    /// The state left by the last transition or restore. `None` until the
    /// first one.
    pub fn previous_state(&self) -> Option<&N> {
        self.previous.map(|id| &self.states[id.0].name)
    }

    pub fn current_id(&self) -> StateId {
        self.current
    }

    pub fn previous_id(&self) -> Option<StateId> {
        self.previous
    }

    pub fn state(&self, id: StateId) -> Option<&State<T, N>> {
        self.states.get(id.0)
    }

    pub fn state_id(&self, name: &N) -> Option<StateId> {
        self.index.get(name).copied()
    }

    pub fn registry(&self) -> &MachineRegistry<T, N> {
        &self.registry
    }

    pub(crate) fn shared_registry(&self) -> Arc<MachineRegistry<T, N>> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_ignoring_current(&self) -> bool {
        self.states[self.current.0].ignoring
    }

    pub fn subscribe(&mut self, observer: Arc<dyn StateObserver<T, N>>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Submit a trigger and run it, cascades included, on the calling thread.
    ///
    /// Async hooks are blocked on. Do not call this from inside an async
    /// runtime when the machine has async hooks; use
    /// [`submit_async`](Self::submit_async) there.
    ///
    /// Returns `Ok(None)` when the trigger produced no transition, otherwise
    /// the state the machine settled in.
    pub fn submit(&mut self, trigger: T) -> Result<Option<N>, EngineError> {
        futures::executor::block_on(self.submit_async(trigger))
    }

    /// Submit a trigger, awaiting async hooks in place.
    ///
    /// Hook ordering is the same as [`submit`](Self::submit) whichever hooks
    /// are async.
    ///
    /// A failing enter hook leaves its state current. For a diversion that
    /// means no automatic return: the machine stays in it until
    /// [`restore`](Self::restore) moves it elsewhere.
    pub async fn submit_async(&mut self, trigger: T) -> Result<Option<N>, EngineError> {
        let limit = self.config.cascade_limit;
        let Some(scheduled) = self.step(trigger).await? else {
            return Ok(None);
        };

        let mut executed = 1;
        let mut frames = vec![scheduled];
        while let Some(frame) = frames.last_mut() {
            let Some(next) = frame.pop_front() else {
                frames.pop();
                continue;
            };
            executed += 1;
            if executed > limit {
                return Err(EngineError::CascadeLimitExceeded { limit });
            }
            if let Some(scheduled) = self.step(next).await? {
                if !scheduled.is_empty() {
                    frames.push(scheduled);
                }
            }
        }

        Ok(Some(self.current_state().clone()))
    }

    /// Move to a state without running hooks or resolving transitions.
    ///
    /// Observers get `on_state_set`.
    pub fn restore(&mut self, name: &N) -> Result<(), EngineError> {
        let id = self
            .state_id(name)
            .ok_or_else(|| EngineError::UnknownState(render(name)))?;
        self.set_state(id);
        Ok(())
    }

    fn set_state(&mut self, id: StateId) {
        let previous = self.current;
        self.previous = Some(previous);
        self.current = id;
        trace!(from = ?self.states[previous.0].name, to = ?self.states[id.0].name, "state restored");
        self.observers
            .notify_set(&self.states[previous.0].name, &self.states[id.0].name);
    }

    /// Run one trigger. `None` means nothing happened; otherwise the triggers
    /// the enter hook scheduled, in order.
    async fn step(&mut self, trigger: T) -> Result<Option<VecDeque<T>>, EngineError> {
        let source = self.current;
        let Some(target) = self.states[source.0].next(&trigger)? else {
            trace!(state = ?self.states[source.0].name, ?trigger, "trigger produced no transition");
            return Ok(None);
        };

        let source_name = self.states[source.0].name.clone();
        let target_name = self.states[target.0].name.clone();

        if target != source {
            let ctx = ExitContext {
                trigger: trigger.clone(),
                source: source_name.clone(),
                destination: target_name.clone(),
            };
            self.states[source.0]
                .on_exit
                .run(&ctx)
                .await
                .map_err(|source| EngineError::HookFailed {
                    state: render(&source_name),
                    source,
                })?;
        }

        self.previous = Some(source);
        self.current = target;
        debug!(from = ?source_name, to = ?target_name, ?trigger, "transition");
        self.observers
            .notify_changed(&source_name, &target_name, &trigger);

        self.states[target.0].activate(target, Some(source))?;

        let scheduler = Scheduler::new();
        let ctx = EnterContext::new(trigger, source_name, target_name, scheduler.clone());
        let state = &self.states[target.0];
        state
            .on_enter
            .run(&ctx)
            .await
            .map_err(|source| EngineError::HookFailed {
                state: render(&state.name),
                source,
            })?;

        if let Some(diversion) = &state.diversion {
            let completion =
                diversion
                    .completion()
                    .map_err(|reason| EngineError::HookContractViolation {
                        state: render(&state.name),
                        reason: reason.to_string(),
                    })?;
            if let Some(restore_to) = completion {
                self.set_state(restore_to);
            }
        }

        Ok(Some(scheduler.take()))
    }
}

impl<T: Trigger, N: StateName> fmt::Debug for StateEngine<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateEngine")
            .field("name", &self.registry.name())
            .field("current", self.current_state())
            .field("previous", &self.previous_state())
            .field("states", &self.states.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
