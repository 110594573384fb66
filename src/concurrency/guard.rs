//! Serializing wrapper around a [`StateEngine`].
//!
//! One submitter at a time owns the "executing" flag and, with it, the
//! engine. Anyone arriving while the flag is set appends their trigger to a
//! FIFO queue and returns `Ok(None)` straight away; the flag holder drains
//! the queue before letting go. Appending never touches the engine lock.

use crate::core::{MachineRegistry, StateName, Trigger};
use crate::engine::{EngineError, StateEngine};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// The last settled `(current, previous)` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot<N> {
    pub current: N,
    pub previous: Option<N>,
}

/// Thread-safe front for a [`StateEngine`].
///
/// # Example
///
/// ```rust
/// use sidetrack::builder::MachineBuilder;
/// use sidetrack::concurrency::ConcurrencyGuard;
///
/// let engine = MachineBuilder::new()
///     .state("Off").transition("toggle", "On").done()
///     .state("On").transition("toggle", "Off").done()
///     .build("Off")
///     .unwrap();
/// let guard = ConcurrencyGuard::new(engine);
///
/// assert_eq!(guard.submit("toggle").unwrap(), Some("On"));
/// assert_eq!(guard.current_state(), "On");
/// ```
pub struct ConcurrencyGuard<T: Trigger, N: StateName> {
    engine: tokio::sync::Mutex<StateEngine<T, N>>,
    executing: AtomicBool,
    queue: Mutex<VecDeque<T>>,
    settled: RwLock<Snapshot<N>>,
    registry: Arc<MachineRegistry<T, N>>,
}

impl<T: Trigger, N: StateName> ConcurrencyGuard<T, N> {
    pub fn new(engine: StateEngine<T, N>) -> Self {
        let settled = Snapshot {
            current: engine.current_state().clone(),
            previous: engine.previous_state().cloned(),
        };
        Self {
            registry: engine.shared_registry(),
            engine: tokio::sync::Mutex::new(engine),
            executing: AtomicBool::new(false),
            queue: Mutex::new(VecDeque::new()),
            settled: RwLock::new(settled),
        }
    }

    /// Blocking form of [`submit_async`](Self::submit_async).
    ///
    /// Same restriction as [`StateEngine::submit`]: do not call from inside
    /// an async runtime when the machine has async hooks.
    pub fn submit(&self, trigger: T) -> Result<Option<N>, EngineError> {
        futures::executor::block_on(self.submit_async(trigger))
    }

    /// Submit a trigger, or queue it if another submission is running.
    ///
    /// `Ok(None)` from a busy guard means "queued, not applied yet". The
    /// caller that owns the engine returns the last state produced by a
    /// successful transition, its own or a queued one. A
    /// [`TransitionNotFound`](EngineError::TransitionNotFound) on the caller's
    /// own trigger is logged and answered with the settled state; other
    /// errors on it are returned once the queue is drained. Errors from queued
    /// triggers are logged and skipped.
    ///
    /// Dropping the future part way through releases the guard. The engine
    /// keeps whatever the interrupted step had already applied.
    pub async fn submit_async(&self, trigger: T) -> Result<Option<N>, EngineError> {
        let Some(claim) = self.try_acquire() else {
            self.queue.lock().push_back(trigger);
            trace!(pending = self.pending(), "engine busy, trigger queued");
            // The holder may have let go between the failed acquire and the push.
            if let Some(claim) = self.try_acquire() {
                self.drain(claim).await;
            }
            return Ok(None);
        };

        let (outcome, before) = {
            let mut engine = self.engine.lock().await;
            let before = engine.current_state().clone();
            let outcome = engine.submit_async(trigger).await;
            self.publish(&engine);
            (outcome, before)
        };
        let drained = self.drain(claim).await;

        match outcome {
            Ok(settled) => Ok(drained.or(settled)),
            Err(err) if err.is_transition_not_found() => {
                warn!(error = %err, "submitted trigger has no transition");
                Ok(drained.or(Some(before)))
            }
            Err(err) => Err(err),
        }
    }

    /// Last settled state pair. Never waits for a running submission.
    pub fn snapshot(&self) -> Snapshot<N> {
        self.settled.read().clone()
    }

    pub fn current_state(&self) -> N {
        self.settled.read().current.clone()
    }

    /// Triggers waiting for the running submission to pick them up.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_executing(&self) -> bool {
        self.executing.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &MachineRegistry<T, N> {
        &self.registry
    }

    pub fn into_inner(self) -> StateEngine<T, N> {
        self.engine.into_inner()
    }

    fn try_acquire(&self) -> Option<Claim<'_>> {
        self.executing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Claim {
                executing: &self.executing,
            })
    }

    fn next_queued(&self) -> Option<T> {
        self.queue.lock().pop_front()
    }

    fn publish(&self, engine: &StateEngine<T, N>) {
        *self.settled.write() = Snapshot {
            current: engine.current_state().clone(),
            previous: engine.previous_state().cloned(),
        };
    }

    /// Drain the queue under `claim`, then release it. Returns the last
    /// state a queued trigger moved to.
    async fn drain(&self, mut claim: Claim<'_>) -> Option<N> {
        let mut last = None;
        loop {
            {
                let mut engine = self.engine.lock().await;
                while let Some(trigger) = self.next_queued() {
                    match engine.submit_async(trigger).await {
                        Ok(Some(state)) => last = Some(state),
                        Ok(None) => {}
                        Err(err) => warn!(error = %err, "queued trigger failed, skipping"),
                    }
                    self.publish(&engine);
                }
            }
            drop(claim);

            // Anything appended after the last pop but before the release
            // would otherwise sit in the queue until the next submission.
            if self.queue.lock().is_empty() {
                return last;
            }
            match self.try_acquire() {
                Some(next) => claim = next,
                None => return last,
            }
        }
    }
}

/// Ownership of the "executing" flag. Dropping it clears the flag, so a
/// submission abandoned mid-await or unwound by a panicking hook never
/// leaves the guard closed. Triggers queued behind it are picked up by the
/// next submitter.
struct Claim<'a> {
    executing: &'a AtomicBool,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.executing.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MachineBuilder;
    use crate::hooks::{EnterContext, HookError};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    type Trail = Arc<Mutex<Vec<&'static str>>>;

    fn log_enter(
        trail: &Trail,
    ) -> impl Fn(&EnterContext<&'static str, &'static str>) -> Result<(), HookError> + Send + Sync
    {
        let trail = Arc::clone(trail);
        move |ctx| {
            trail.lock().push(ctx.destination);
            Ok(())
        }
    }

    fn counter_machine(count: Arc<AtomicUsize>) -> StateEngine<&'static str, &'static str> {
        MachineBuilder::new()
            .state("Spin")
            .self_loop("tick")
            .on_enter(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .done()
            .build("Spin")
            .unwrap()
    }

    #[test]
    fn uncontended_submit_behaves_like_the_engine() {
        let count = Arc::new(AtomicUsize::new(0));
        let guard = ConcurrencyGuard::new(counter_machine(Arc::clone(&count)));

        assert_eq!(guard.submit("tick").unwrap(), Some("Spin"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!guard.is_executing());
        assert_eq!(guard.pending(), 0);
        assert_eq!(
            guard.snapshot(),
            Snapshot {
                current: "Spin",
                previous: Some("Spin"),
            }
        );
    }

    #[test]
    fn non_transition_errors_are_returned() {
        let engine = MachineBuilder::new()
            .state("A")
            .transition("go", "B")
            .done()
            .state("B")
            .on_enter(|_| Err(crate::hooks::HookError::new("nope")))
            .done()
            .build("A")
            .unwrap();
        let guard = ConcurrencyGuard::new(engine);

        assert!(matches!(
            guard.submit("go"),
            Err(EngineError::HookFailed { .. })
        ));
        assert_eq!(guard.current_state(), "B");
        assert!(!guard.is_executing());
    }

    #[test]
    fn unresolved_trigger_returns_settled_state() {
        let engine = MachineBuilder::new()
            .state("A")
            .done()
            .build("A")
            .unwrap();
        let guard = ConcurrencyGuard::new(engine);

        assert_eq!(guard.submit("missing").unwrap(), Some("A"));
    }

    #[test]
    fn busy_guard_queues_and_holder_drains() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let (hook_entered, hook_release) = (Arc::clone(&entered), Arc::clone(&release));

        let engine = MachineBuilder::new()
            .state("Idle")
            .transition("go", "Busy")
            .done()
            .state("Busy")
            .transition("done", "Finished")
            .on_enter(move |_| {
                hook_entered.wait();
                hook_release.wait();
                Ok(())
            })
            .done()
            .state("Finished")
            .done()
            .build("Idle")
            .unwrap();
        let guard = Arc::new(ConcurrencyGuard::new(engine));

        let holder = {
            let guard = Arc::clone(&guard);
            thread::spawn(move || guard.submit("go"))
        };

        entered.wait();
        assert!(guard.is_executing());
        assert_eq!(guard.submit("done").unwrap(), None);
        assert_eq!(guard.pending(), 1);
        release.wait();

        assert_eq!(holder.join().unwrap().unwrap(), Some("Finished"));
        assert_eq!(guard.current_state(), "Finished");
        assert_eq!(guard.pending(), 0);
    }

    #[test]
    fn failed_first_trigger_still_drains_the_queue() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let (veto_entered, veto_release) = (Arc::clone(&entered), Arc::clone(&release));

        let engine = MachineBuilder::new()
            .state("Idle")
            .transition("go", "Busy")
            .veto_exit(move |trigger: &&'static str| {
                if *trigger == "probe" {
                    veto_entered.wait();
                    veto_release.wait();
                }
                false
            })
            .done()
            .state("Busy")
            .done()
            .build("Idle")
            .unwrap();
        let guard = Arc::new(ConcurrencyGuard::new(engine));

        let holder = {
            let guard = Arc::clone(&guard);
            thread::spawn(move || guard.submit("probe"))
        };

        entered.wait();
        assert_eq!(guard.submit("go").unwrap(), None);
        release.wait();

        assert_eq!(holder.join().unwrap().unwrap(), Some("Busy"));
        assert_eq!(guard.current_state(), "Busy");
    }

    #[test]
    fn queued_triggers_apply_in_order_and_failures_are_skipped() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let (hook_entered, hook_release) = (Arc::clone(&entered), Arc::clone(&release));
        let trail: Trail = Arc::new(Mutex::new(Vec::new()));
        let busy_trail = Arc::clone(&trail);

        let engine = MachineBuilder::new()
            .state("Idle")
            .transition("go", "Busy")
            .done()
            .state("Busy")
            .transition("a", "A")
            .on_enter(move |ctx| {
                busy_trail.lock().push(ctx.destination);
                hook_entered.wait();
                hook_release.wait();
                Ok(())
            })
            .done()
            .state("A")
            .transition("b", "B")
            .on_enter(log_enter(&trail))
            .done()
            .state("B")
            .transition("c", "C")
            .on_enter(log_enter(&trail))
            .done()
            .state("C")
            .on_enter(log_enter(&trail))
            .done()
            .build("Idle")
            .unwrap();
        let guard = Arc::new(ConcurrencyGuard::new(engine));

        let holder = {
            let guard = Arc::clone(&guard);
            thread::spawn(move || guard.submit("go"))
        };

        entered.wait();
        // "c" has no transition out of A, so the first one is skipped.
        for trigger in ["a", "c", "b", "c"] {
            assert_eq!(guard.submit(trigger).unwrap(), None);
        }
        assert_eq!(guard.pending(), 4);
        release.wait();

        assert_eq!(holder.join().unwrap().unwrap(), Some("C"));
        assert_eq!(*trail.lock(), vec!["Busy", "A", "B", "C"]);
        assert_eq!(
            guard.snapshot(),
            Snapshot {
                current: "C",
                previous: Some("B"),
            }
        );
        assert_eq!(guard.pending(), 0);
        assert!(!guard.is_executing());
    }

    #[tokio::test]
    async fn abandoned_submission_releases_the_guard() {
        let engine = MachineBuilder::new()
            .state("Idle")
            .transition("slow", "Slow")
            .done()
            .state("Slow")
            .transition("back", "Idle")
            .on_enter_async(|_| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<(), HookError>(())
            })
            .done()
            .build("Idle")
            .unwrap();
        let guard = ConcurrencyGuard::new(engine);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), guard.submit_async("slow")).await;
        assert!(abandoned.is_err());
        assert!(!guard.is_executing());

        assert_eq!(guard.submit_async("back").await.unwrap(), Some("Idle"));
        assert_eq!(guard.current_state(), "Idle");
        assert_eq!(guard.pending(), 0);
    }

    #[test]
    fn panicking_hook_releases_the_guard() {
        let engine = MachineBuilder::new()
            .state("Idle")
            .transition("boom", "Broken")
            .done()
            .state("Broken")
            .transition("fix", "Idle")
            .on_enter(|_| panic!("hook blew up"))
            .done()
            .build("Idle")
            .unwrap();
        let guard = Arc::new(ConcurrencyGuard::new(engine));

        let crashed = {
            let guard = Arc::clone(&guard);
            thread::spawn(move || guard.submit("boom")).join()
        };
        assert!(crashed.is_err());
        assert!(!guard.is_executing());

        assert_eq!(guard.submit("fix").unwrap(), Some("Idle"));
        assert_eq!(guard.current_state(), "Idle");
    }

    #[test]
    fn concurrent_submissions_are_never_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let guard = Arc::new(ConcurrencyGuard::new(counter_machine(Arc::clone(&count))));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                thread::spawn(move || {
                    for _ in 0..50 {
                        guard.submit("tick").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 400);
        assert_eq!(guard.pending(), 0);
        assert!(!guard.is_executing());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn async_submissions_are_serialized() {
        let active = Arc::new(AtomicUsize::new(0));
        let count = Arc::new(AtomicUsize::new(0));
        let (hook_active, hook_count) = (Arc::clone(&active), Arc::clone(&count));

        let engine = MachineBuilder::new()
            .state("Spin")
            .self_loop("tick")
            .on_enter_async(move |_| {
                let active = Arc::clone(&hook_active);
                let count = Arc::clone(&hook_count);
                async move {
                    assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                    tokio::task::yield_now().await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .done()
            .build("Spin")
            .unwrap();
        let guard = Arc::new(ConcurrencyGuard::new(engine));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let guard = Arc::clone(&guard);
                tokio::spawn(async move { guard.submit_async("tick").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 16);
        assert_eq!(guard.pending(), 0);
    }

    #[test]
    fn into_inner_returns_the_engine() {
        let count = Arc::new(AtomicUsize::new(0));
        let guard = ConcurrencyGuard::new(counter_machine(count));
        guard.submit("tick").unwrap();

        let engine = guard.into_inner();
        assert_eq!(engine.previous_state(), Some(&"Spin"));
        assert_eq!(engine.registry().name(), None);
    }
}
