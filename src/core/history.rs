//! Transition history.
//!
//! Immutable, timestamped record of the states a machine passed through.
//! Trigger-driven transitions carry their trigger; hook-free restores
//! performed by diversions carry none.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single state change.
///
/// # Example
///
/// ```rust
/// use sidetrack::core::TransitionRecord;
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from: "Idle",
///     to: "Running",
///     trigger: Some("start"),
///     timestamp: Utc::now(),
/// };
/// assert!(record.is_triggered());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord<T, N> {
    /// The state being left
    pub from: N,
    /// The state being entered
    pub to: N,
    /// The trigger that caused the change, `None` for a restore
    pub trigger: Option<T>,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
}

impl<T, N> TransitionRecord<T, N> {
    pub fn is_triggered(&self) -> bool {
        self.trigger.is_some()
    }
}

/// Ordered history of state changes.
///
/// `record` returns a new history with the change appended and leaves the
/// original untouched.
///
/// # Example
///
/// ```rust
/// use sidetrack::core::{TransitionHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let history = TransitionHistory::new()
///     .record(TransitionRecord {
///         from: "Start",
///         to: "Middle",
///         trigger: Some(1u8),
///         timestamp: Utc::now(),
///     })
///     .record(TransitionRecord {
///         from: "Middle",
///         to: "End",
///         trigger: Some(2u8),
///         timestamp: Utc::now(),
///     });
///
/// assert_eq!(history.path(), vec![&"Start", &"Middle", &"End"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionHistory<T, N> {
    records: Vec<TransitionRecord<T, N>>,
}

impl<T, N> Default for TransitionHistory<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, N> TransitionHistory<T, N> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[TransitionRecord<T, N>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// States traversed: the first `from`, then every `to` in order.
    pub fn path(&self) -> Vec<&N> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            path.push(&first.from);
        }
        for record in &self.records {
            path.push(&record.to);
        }
        path
    }

    /// Triggers in the order they caused transitions. Restores are skipped.
    pub fn triggers(&self) -> Vec<&T> {
        self.records
            .iter()
            .filter_map(|record| record.trigger.as_ref())
            .collect()
    }

    /// Time between the first and last recorded change.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.first()?, self.records.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}

impl<T: Clone, N: Clone> TransitionHistory<T, N> {
    /// Record a change, returning a new history.
    pub fn record(&self, record: TransitionRecord<T, N>) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// Append in place. Used by recorders that own their history.
    pub(crate) fn push(&mut self, record: TransitionRecord<T, N>) {
        self.records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Phase {
        Initial,
        Processing,
        Complete,
    }

    fn change(from: Phase, to: Phase, trigger: Option<u8>) -> TransitionRecord<u8, Phase> {
        TransitionRecord {
            from,
            to,
            trigger,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: TransitionHistory<u8, Phase> = TransitionHistory::new();
        assert!(history.is_empty());
        assert!(history.path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = TransitionHistory::new();
        let new_history = history.record(change(Phase::Initial, Phase::Processing, Some(1)));

        assert_eq!(history.len(), 0);
        assert_eq!(new_history.len(), 1);
    }

    #[test]
    fn path_returns_state_sequence() {
        let history = TransitionHistory::new()
            .record(change(Phase::Initial, Phase::Processing, Some(1)))
            .record(change(Phase::Processing, Phase::Complete, Some(2)));

        let path = history.path();
        assert_eq!(path, vec![&Phase::Initial, &Phase::Processing, &Phase::Complete]);
    }

    #[test]
    fn triggers_skip_restores() {
        let history = TransitionHistory::new()
            .record(change(Phase::Initial, Phase::Processing, Some(7)))
            .record(change(Phase::Processing, Phase::Initial, None));

        assert_eq!(history.triggers(), vec![&7]);
        assert!(!history.records()[1].is_triggered());
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let start = Utc::now();
        let history = TransitionHistory::new()
            .record(TransitionRecord {
                from: Phase::Initial,
                to: Phase::Processing,
                trigger: Some(1u8),
                timestamp: start,
            })
            .record(TransitionRecord {
                from: Phase::Processing,
                to: Phase::Complete,
                trigger: Some(2u8),
                timestamp: start + chrono::Duration::milliseconds(10),
            });

        assert_eq!(history.duration(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn history_serializes_correctly() {
        let history = TransitionHistory::new()
            .record(change(Phase::Initial, Phase::Processing, Some(1)));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: TransitionHistory<u8, Phase> = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.records(), history.records());
    }
}
