// src/workflow/analysis.rs

//! Workflow shape analysis used by the adaptive strategy.

use serde::Serialize;

use crate::workflow::TaskSpec;

const SIMPLE_COMPLEXITY: f64 = 0.3;
const COMPLEX_COMPLEXITY: f64 = 0.7;
const EMPTY_COMPLEXITY: f64 = 0.5;

/// Descriptions of at most this many words count as simple.
const SIMPLE_WORD_LIMIT: usize = 3;

/// Independent workflows larger than this run fully parallel.
const PARALLEL_TASK_THRESHOLD: usize = 5;

/// Slack for float error when averaging complexities.
const COMPLEXITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkflowAnalysis {
    pub has_dependencies: bool,
    pub task_count: usize,
    pub avg_task_complexity: f64,
}

/// Concrete plan chosen for an adaptive run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPlan {
    Sequential,
    /// Dependent, complex steps: parallel within each dependency level.
    ParallelByLevel,
    /// Many independent steps: everything in one level.
    FullParallel,
}

impl WorkflowAnalysis {
    pub fn analyze(tasks: &[TaskSpec]) -> Self {
        let has_dependencies = tasks.iter().any(|t| !t.dependencies.is_empty());

        let avg_task_complexity = if tasks.is_empty() {
            EMPTY_COMPLEXITY
        } else {
            let total: f64 = tasks.iter().map(|t| step_complexity(&t.description)).sum();
            total / tasks.len() as f64
        };

        Self {
            has_dependencies,
            task_count: tasks.len(),
            avg_task_complexity,
        }
    }

    /// Pick a plan; `complexity_threshold` is inclusive.
    pub fn plan(&self, complexity_threshold: f64) -> ExecutionPlan {
        if self.has_dependencies
            && self.avg_task_complexity + COMPLEXITY_EPSILON >= complexity_threshold
        {
            ExecutionPlan::ParallelByLevel
        } else if !self.has_dependencies && self.task_count > PARALLEL_TASK_THRESHOLD {
            ExecutionPlan::FullParallel
        } else {
            ExecutionPlan::Sequential
        }
    }
}

fn step_complexity(description: &str) -> f64 {
    if description.split_whitespace().count() <= SIMPLE_WORD_LIMIT {
        SIMPLE_COMPLEXITY
    } else {
        COMPLEX_COMPLEXITY
    }
}
