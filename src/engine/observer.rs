//! State-change observers.
//!
//! Observers receive read-only references after every change. Two channels
//! exist: `on_state_changed` for trigger-driven transitions and
//! `on_state_set` for hook-free restores. Observers are notified in the order
//! they subscribed and must not try to drive the engine from a callback.

use crate::core::{StateName, TransitionHistory, TransitionRecord, Trigger};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Receiver of engine notifications. Both methods default to doing nothing.
pub trait StateObserver<T, N>: Send + Sync {
    fn on_state_changed(&self, _previous: &N, _current: &N, _trigger: &T) {}

    fn on_state_set(&self, _previous: &N, _current: &N) {}
}

/// Handle returned by [`ObserverRegistry::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered set of observers owned by an engine.
pub struct ObserverRegistry<T, N> {
    next_id: u64,
    observers: Vec<(SubscriptionId, Arc<dyn StateObserver<T, N>>)>,
}

impl<T, N> Default for ObserverRegistry<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, N> ObserverRegistry<T, N> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Arc<dyn StateObserver<T, N>>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer. Returns `false` when the id is not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(subscribed, _)| *subscribed != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn notify_changed(&self, previous: &N, current: &N, trigger: &T) {
        for (_, observer) in &self.observers {
            observer.on_state_changed(previous, current, trigger);
        }
    }

    pub(crate) fn notify_set(&self, previous: &N, current: &N) {
        for (_, observer) in &self.observers {
            observer.on_state_set(previous, current);
        }
    }
}

/// Logs every change through `tracing` at info level.
#[derive(Debug, Clone)]
pub struct TransitionLogger {
    machine: String,
}

impl TransitionLogger {
    pub fn new(machine: Option<&str>) -> Self {
        Self {
            machine: machine.unwrap_or("no_name").to_string(),
        }
    }
}

impl<T: Trigger, N: StateName> StateObserver<T, N> for TransitionLogger {
    fn on_state_changed(&self, previous: &N, current: &N, trigger: &T) {
        info!(machine = %self.machine, ?trigger, from = ?previous, to = ?current, "state changed");
    }

    fn on_state_set(&self, previous: &N, current: &N) {
        info!(machine = %self.machine, from = ?previous, to = ?current, "state set");
    }
}

/// Records every change into a [`TransitionHistory`].
#[derive(Debug)]
pub struct HistoryRecorder<T, N> {
    history: Mutex<TransitionHistory<T, N>>,
}

impl<T: Trigger, N: StateName> Default for HistoryRecorder<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Trigger, N: StateName> HistoryRecorder<T, N> {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(TransitionHistory::new()),
        }
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> TransitionHistory<T, N> {
        self.history.lock().clone()
    }
}

impl<T: Trigger, N: StateName> StateObserver<T, N> for HistoryRecorder<T, N> {
    fn on_state_changed(&self, previous: &N, current: &N, trigger: &T) {
        self.history.lock().push(TransitionRecord {
            from: previous.clone(),
            to: current.clone(),
            trigger: Some(trigger.clone()),
            timestamp: Utc::now(),
        });
    }

    fn on_state_set(&self, previous: &N, current: &N) {
        self.history.lock().push(TransitionRecord {
            from: previous.clone(),
            to: current.clone(),
            trigger: None,
            timestamp: Utc::now(),
        });
    }
}
