// src/queue/task.rs

//! The unit of schedulable work.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{TaskPriority, TaskStatus};

/// Canonical task id type used throughout the queue.
pub type TaskId = String;

/// A queued task plus its execution bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Opaque command name handed to the executor.
    pub intent: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Ids that must be `Completed` before this task may run.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    #[serde(default, rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

pub const DEFAULT_MAX_RETRIES: u32 = 3;

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Task {
    pub fn new(id: impl Into<TaskId>, intent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            intent: intent.into(),
            parameters: Map::new(),
            priority: TaskPriority::default(),
            dependencies: Vec::new(),
            timeout: None,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            tags: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependency(mut self, dep: impl Into<TaskId>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Timeouts are stored as integer milliseconds in snapshots.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_defaults() {
        let task = Task::new("a", "open_browser");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Normal);
        assert_eq!(task.max_retries, 3);
        assert_eq!(task.retry_count, 0);
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn timeout_is_stored_in_milliseconds() {
        let task = Task::new("a", "noop").with_timeout(Duration::from_millis(1500));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["timeout_ms"], 1500);
        assert_eq!(json["priority"], "normal");

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn missing_optional_fields_fall_back_to_defaults() {
        let json = serde_json::json!({
            "id": "legacy",
            "intent": "noop",
            "created_at": "2024-01-01T00:00:00Z",
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(task.timeout, None);
        assert_eq!(task.status, TaskStatus::Pending);
    }
}
