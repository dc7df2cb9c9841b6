// src/workflow/mod.rs

//! One-shot workflow execution.
//!
//! A workflow is a fixed list of [`TaskSpec`]s whose dependencies refer to
//! each other by index. The [`WorkflowOrchestrator`] runs it sequentially,
//! in parallel by dependency level, or picks one of those adaptively from
//! a [`WorkflowAnalysis`]. Nothing here is persisted.

pub mod analysis;
pub mod orchestrator;
pub mod spec;

pub use analysis::{ExecutionPlan, WorkflowAnalysis};
pub use orchestrator::{
    OptimizedStep, WorkflowOrchestrator, WorkflowReport, WorkflowSettings, WorkflowStatus,
};
pub use spec::TaskSpec;
