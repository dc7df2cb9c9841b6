// src/dag/mod.rs

//! Dependency bookkeeping shared by the queue and the orchestrator.
//!
//! - [`dependency_index`] keeps reverse edges so the queue can wake the
//!   dependents of a finished task without scanning every task.
//! - [`leveler`] layers a fixed task set into dependency levels for
//!   parallel execution.

pub mod dependency_index;
pub mod leveler;

pub use dependency_index::DependencyIndex;
pub use leveler::{compute_levels, topological_order};
