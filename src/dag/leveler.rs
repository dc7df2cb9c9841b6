// src/dag/leveler.rs

//! Topological layering of a fixed task set.

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::workflow::TaskSpec;

/// Group task indices into dependency levels.
///
/// Every dependency of a task in level `k` lies in some level `< k`.
/// If a pass finds no task whose dependencies are all placed while tasks
/// remain (a cycle, or a reference to an index that does not exist), every
/// remaining task is forced into the current level. The result therefore
/// always covers every task and the loop always terminates.
pub fn compute_levels(tasks: &[TaskSpec]) -> Vec<Vec<usize>> {
    let mut levels: Vec<Vec<usize>> = Vec::new();
    let mut processed: HashSet<usize> = HashSet::new();

    loop {
        let remaining: Vec<&TaskSpec> = tasks
            .iter()
            .filter(|t| !processed.contains(&t.index))
            .collect();

        if remaining.is_empty() {
            break;
        }

        let mut level: Vec<usize> = remaining
            .iter()
            .filter(|t| t.dependencies.iter().all(|d| processed.contains(d)))
            .map(|t| t.index)
            .collect();

        if level.is_empty() {
            level = remaining.iter().map(|t| t.index).collect();
            warn!(
                level = levels.len(),
                forced = ?level,
                "circular or dangling dependency; forcing remaining tasks into one level"
            );
        }

        debug!(level = levels.len(), tasks = ?level, "computed dependency level");
        processed.extend(level.iter().copied());
        levels.push(level);
    }

    levels
}

/// Dependency-respecting execution order for `tasks`.
///
/// References to unknown indices are ignored. If the remaining graph has a
/// cycle, the flattened output of [`compute_levels`] is returned instead.
pub fn topological_order(tasks: &[TaskSpec]) -> Vec<usize> {
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    let known: HashSet<usize> = tasks.iter().map(|t| t.index).collect();

    for task in tasks {
        graph.add_node(task.index);
    }
    for task in tasks {
        for dep in task.dependencies.iter().filter(|d| known.contains(d)) {
            graph.add_edge(*dep, task.index, ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => order,
        Err(cycle) => {
            warn!(
                task = cycle.node_id(),
                "cycle detected while ordering workflow; using level order"
            );
            compute_levels(tasks).into_iter().flatten().collect()
        }
    }
}
