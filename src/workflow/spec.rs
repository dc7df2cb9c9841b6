// src/workflow/spec.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::queue::Task;

/// One step of a workflow, addressed by its position in the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub index: usize,
    pub description: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Indices of steps that must complete first.
    #[serde(default)]
    pub dependencies: Vec<usize>,
}

impl TaskSpec {
    pub fn new(index: usize, description: impl Into<String>) -> Self {
        Self {
            index,
            description: description.into(),
            parameters: Map::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = usize>) -> Self {
        self.dependencies.extend(deps);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// The task view handed to the executor.
    ///
    /// Ids are `"<workflow_id>:<index>"`; the description becomes the
    /// intent. Retries are driven by the orchestrator, so the task itself
    /// carries none.
    pub fn to_task(&self, workflow_id: &str) -> Task {
        let mut task = Task::new(step_id(workflow_id, self.index), self.description.clone())
            .with_dependencies(self.dependencies.iter().map(|d| step_id(workflow_id, *d)))
            .with_max_retries(0)
            .with_tag(format!("workflow:{workflow_id}"));
        task.parameters = self.parameters.clone();
        task
    }
}

fn step_id(workflow_id: &str, index: usize) -> String {
    format!("{workflow_id}:{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_task_namespaces_ids_under_the_workflow() {
        let spec = TaskSpec::new(2, "send report")
            .with_dependencies([0, 1])
            .with_parameter("to", "ops@example.com");

        let task = spec.to_task("wf-7");
        assert_eq!(task.id, "wf-7:2");
        assert_eq!(task.intent, "send report");
        assert_eq!(task.dependencies, vec!["wf-7:0", "wf-7:1"]);
        assert_eq!(task.parameters["to"], "ops@example.com");
        assert_eq!(task.max_retries, 0);
        assert!(task.has_tag("workflow:wf-7"));
    }

    #[test]
    fn deserialises_with_defaults() {
        let spec: TaskSpec =
            serde_json::from_str(r#"{ "index": 0, "description": "open inbox" }"#).unwrap();
        assert!(spec.dependencies.is_empty());
        assert!(spec.parameters.is_empty());
    }
}
