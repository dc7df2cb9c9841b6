// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::exec::ShellExecutor;
use crate::queue::{QueueOptions, Task};
use crate::types::{TaskPriority, deserialize_duration, deserialize_opt_duration};
use crate::workflow::WorkflowSettings;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [queue]
/// max_concurrent = 4
/// persist_path = "state/queue.json"
/// poll_interval = "250ms"
///
/// [workflow]
/// max_parallel = 3
/// max_retries = 2
/// backoff = "1s"
///
/// [task.fetch]
/// cmd = "curl -sSf https://example.com"
/// priority = "high"
///
/// [task.report]
/// cmd = "echo done"
/// after = ["fetch"]
/// timeout = "30s"
/// ```
///
/// All sections are optional and have defaults. This is the unvalidated
/// form; [`ConfigFile`] is obtained through `TryFrom`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub queue: QueueSection,

    #[serde(default)]
    pub workflow: WorkflowSection,

    /// All tasks from `[task.<id>]`, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub queue: QueueSection,
    pub workflow: WorkflowSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    /// Build without validation. Use `ConfigFile::try_from(raw)` instead
    /// unless the parts are known to be valid.
    pub fn new_unchecked(
        queue: QueueSection,
        workflow: WorkflowSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            queue,
            workflow,
            task,
        }
    }

    pub fn queue_options(&self) -> QueueOptions {
        QueueOptions {
            max_concurrent: self.queue.max_concurrent,
            poll_interval: self.queue.poll_interval,
            persist_path: self.queue.persist_path.clone(),
        }
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            max_parallel: self.workflow.max_parallel,
            retry_failed: self.workflow.retry_failed,
            max_retries: self.workflow.max_retries,
            continue_on_failure: self.workflow.continue_on_failure,
            backoff_unit: self.workflow.backoff,
            complexity_threshold: self.workflow.complexity_threshold,
        }
    }

    /// Queue tasks for every `[task.<id>]`, in id order.
    pub fn queue_tasks(&self) -> Vec<Task> {
        self.task
            .iter()
            .map(|(id, cfg)| cfg.to_task(id))
            .collect()
    }

    /// Position of each task id in [`queue_tasks`](Self::queue_tasks) order,
    /// used as workflow step index.
    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.task.keys().position(|k| k == id)
    }
}

/// `[queue]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSection {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Snapshot file; omit to keep the queue in memory.
    #[serde(default)]
    pub persist_path: Option<PathBuf>,

    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub poll_interval: Duration,
}

fn default_max_concurrent() -> usize {
    5
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(250)
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            persist_path: None,
            poll_interval: default_poll_interval(),
        }
    }
}

/// `[workflow]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSection {
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    #[serde(default = "default_true")]
    pub retry_failed: bool,

    #[serde(default = "default_workflow_retries")]
    pub max_retries: u32,

    #[serde(default)]
    pub continue_on_failure: bool,

    /// Backoff unit between step retries.
    #[serde(default = "default_backoff", deserialize_with = "deserialize_duration")]
    pub backoff: Duration,

    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: f64,
}

fn default_max_parallel() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_workflow_retries() -> u32 {
    2
}

fn default_backoff() -> Duration {
    Duration::from_secs(1)
}

fn default_complexity_threshold() -> f64 {
    0.7
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            retry_failed: true,
            max_retries: default_workflow_retries(),
            continue_on_failure: false,
            backoff: default_backoff(),
            complexity_threshold: default_complexity_threshold(),
        }
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Opaque command name handed to the executor. Defaults to `"shell"`.
    #[serde(default = "default_intent")]
    pub intent: String,

    /// Shell command, stored as the `cmd` parameter.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Free-form description; used for workflow complexity analysis.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Map<String, Value>,

    #[serde(default)]
    pub priority: TaskPriority,

    /// Ids of tasks that must complete first.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_opt_duration")]
    pub timeout: Option<Duration>,

    #[serde(default)]
    pub max_retries: Option<u32>,

    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_intent() -> String {
    ShellExecutor::INTENT.to_string()
}

impl TaskConfig {
    pub fn to_task(&self, id: &str) -> Task {
        let mut task = Task::new(id, self.intent.clone())
            .with_priority(self.priority)
            .with_dependencies(self.after.iter().cloned());
        task.parameters = self.parameters.clone();
        if let Some(cmd) = &self.cmd {
            task.parameters
                .insert("cmd".to_string(), Value::String(cmd.clone()));
        }
        if let Some(timeout) = self.timeout {
            task = task.with_timeout(timeout);
        }
        if let Some(max_retries) = self.max_retries {
            task = task.with_max_retries(max_retries);
        }
        for tag in &self.tags {
            task = task.with_tag(tag.clone());
        }
        task
    }

    /// Description used for workflow steps: the explicit description, else
    /// the command, else the intent.
    pub fn step_description(&self) -> String {
        self.description
            .clone()
            .or_else(|| self.cmd.clone())
            .unwrap_or_else(|| self.intent.clone())
    }
}
