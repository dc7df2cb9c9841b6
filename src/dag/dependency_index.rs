// src/dag/dependency_index.rs

use std::collections::{BTreeSet, HashMap};

/// Reverse-edge map: task id -> ids of tasks that list it as a dependency.
///
/// Built incrementally as tasks are added to the queue. Edges may point at
/// ids that are not (yet) known to the queue; a dependent registered before
/// its dependency simply waits until that dependency shows up and completes.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    dependents: HashMap<String, BTreeSet<String>>,
}

impl DependencyIndex {
    /// Register `task` as a dependent of every id in `deps`.
    pub fn register<'a>(&mut self, task: &str, deps: impl IntoIterator<Item = &'a String>) {
        for dep in deps {
            self.dependents
                .entry(dep.clone())
                .or_default()
                .insert(task.to_string());
        }
    }

    /// Remove the edges that `task` contributed via its dependency list.
    pub fn unregister<'a>(&mut self, task: &str, deps: impl IntoIterator<Item = &'a String>) {
        for dep in deps {
            if let Some(set) = self.dependents.get_mut(dep) {
                set.remove(task);
                if set.is_empty() {
                    self.dependents.remove(dep);
                }
            }
        }
    }

    /// Immediate dependents of `task` in a stable (sorted) order.
    pub fn dependents_of(&self, task: &str) -> Vec<String> {
        self.dependents
            .get(task)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}
