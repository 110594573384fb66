//! Exit-veto predicates.
//!
//! A veto is a pure predicate over the incoming trigger. When it answers
//! `true` the state refuses to be left: resolution stops before any
//! transition lookup and the submission produces no state change.

use super::label::Trigger;
use std::fmt;

/// Predicate that can unconditionally block a state from being left.
///
/// # Example
///
/// ```rust
/// use sidetrack::core::ExitVeto;
///
/// // Refuse every trigger except 0.
/// let veto = ExitVeto::new(|trigger: &u8| *trigger != 0);
///
/// assert!(veto.vetoes(&3));
/// assert!(!veto.vetoes(&0));
/// ```
pub struct ExitVeto<T: Trigger> {
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: Trigger> ExitVeto<T> {
    /// Create a veto from a predicate returning `true` to block the exit.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        ExitVeto {
            predicate: Box::new(predicate),
        }
    }

    /// Check whether this trigger is blocked.
    pub fn vetoes(&self, trigger: &T) -> bool {
        (self.predicate)(trigger)
    }
}

impl<T: Trigger> fmt::Debug for ExitVeto<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitVeto").finish_non_exhaustive()
    }
}
