//! Builder API for declarative machine construction.
//!
//! States are declared by name with [`MachineBuilder`] and resolved in one
//! pass by [`MachineBuilder::build`]. The [`label_enum!`](crate::label_enum)
//! macro removes the boilerplate of declaring trigger and state enums.

mod diversion;
pub mod error;
pub mod machine;
pub mod macros;
pub mod state;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;
