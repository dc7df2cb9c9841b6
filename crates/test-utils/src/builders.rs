#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use taskweave::config::{ConfigFile, QueueSection, RawConfigFile, TaskConfig, WorkflowSection};
use taskweave::types::TaskPriority;
use taskweave::workflow::TaskSpec;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                queue: QueueSection::default(),
                workflow: WorkflowSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, id: &str, task: TaskConfig) -> Self {
        self.config.task.insert(id.to_string(), task);
        self
    }

    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.config.queue.max_concurrent = n;
        self
    }

    pub fn persist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.queue.persist_path = Some(path.into());
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.config.workflow.max_parallel = n;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                intent: "shell".to_string(),
                cmd: Some(cmd.to_string()),
                description: None,
                parameters: Default::default(),
                priority: TaskPriority::Normal,
                after: vec![],
                timeout: None,
                max_retries: None,
                tags: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.task.timeout = Some(timeout);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.task.description = Some(description.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Workflow steps from `(description, dependencies)` pairs, indexed by
/// position.
pub fn workflow(steps: &[(&str, &[usize])]) -> Vec<TaskSpec> {
    steps
        .iter()
        .enumerate()
        .map(|(i, (desc, deps))| TaskSpec::new(i, *desc).with_dependencies(deps.iter().copied()))
        .collect()
}
