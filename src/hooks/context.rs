//! Contexts handed to lifecycle hooks.

use crate::core::{StateName, Trigger};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Handle an enter hook uses to queue follow-up triggers.
///
/// Scheduled triggers run after the hook returns, in the order they were
/// scheduled, before the submission that entered the state returns.
#[derive(Clone, Debug)]
pub struct Scheduler<T> {
    queue: Arc<Mutex<VecDeque<T>>>,
}

impl<T: Trigger> Scheduler<T> {
    pub(crate) fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn schedule(&self, trigger: T) {
        self.queue.lock().push_back(trigger);
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    pub(crate) fn take(&self) -> VecDeque<T> {
        std::mem::take(&mut *self.queue.lock())
    }
}

/// Context for enter hooks.
#[derive(Clone, Debug)]
pub struct EnterContext<T, N> {
    pub trigger: T,
    /// The state that was current before this one.
    pub source: N,
    /// The state being entered.
    pub destination: N,
    scheduler: Scheduler<T>,
}

impl<T: Trigger, N: StateName> EnterContext<T, N> {
    pub(crate) fn new(trigger: T, source: N, destination: N, scheduler: Scheduler<T>) -> Self {
        Self {
            trigger,
            source,
            destination,
            scheduler,
        }
    }

    /// Queue a trigger to run once this hook finishes.
    pub fn schedule(&self, trigger: T) {
        self.scheduler.schedule(trigger);
    }

    pub fn scheduler(&self) -> &Scheduler<T> {
        &self.scheduler
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.destination
    }
}

/// Context for exit hooks. Exits cannot schedule follow-ups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitContext<T, N> {
    pub trigger: T,
    /// The state being left.
    pub source: N,
    pub destination: N,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_preserves_fifo_order() {
        let scheduler = Scheduler::new();
        scheduler.schedule(1);
        scheduler.schedule(2);
        scheduler.schedule(3);

        assert_eq!(scheduler.pending(), 3);
        assert_eq!(scheduler.take(), VecDeque::from(vec![1, 2, 3]));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn context_clones_share_the_scheduler() {
        let scheduler = Scheduler::new();
        let ctx = EnterContext::new("go", "A", "B", scheduler.clone());
        let copy = ctx.clone();

        ctx.schedule("next");
        copy.schedule("after");

        assert_eq!(scheduler.take(), VecDeque::from(vec!["next", "after"]));
    }

    #[test]
    fn detects_self_loops() {
        let looping = EnterContext::new("tick", "A", "A", Scheduler::new());
        let moving = EnterContext::new("tick", "A", "B", Scheduler::new());

        assert!(looping.is_self_loop());
        assert!(!moving.is_self_loop());
    }
}
