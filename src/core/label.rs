//! Marker traits for the two kinds of labels a machine is generic over.
//!
//! Triggers and state names are opaque to the engine: it only hashes,
//! compares, clones and formats them. Any type with the right bounds
//! qualifies through the blanket implementations below, so plain enums
//! (see [`label_enum!`](crate::label_enum)), integers and strings all work.

use std::fmt::Debug;
use std::hash::Hash;

/// An external event value that drives a transition lookup.
pub trait Trigger: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Trigger for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// An identifier naming a state inside one machine.
pub trait StateName: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<N> StateName for N where N: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Render a label for an error message: its `Debug` form, minus the quotes
/// string labels would otherwise carry.
pub(crate) fn render<L: Debug>(label: &L) -> String {
    let rendered = format!("{:?}", label);
    match rendered.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')) {
        Some(inner) => inner.to_string(),
        None => rendered,
    }
}
