// src/queue/snapshot.rs

//! JSON snapshot of the queue, written after every mutation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{Result, TaskweaveError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::queue::task::{Task, TaskId};

/// On-disk document.
///
/// ```json
/// {
///   "tasks": { "<id>": { "id": "...", "status": "pending", ... } },
///   "completed_tasks": ["id1"],
///   "timestamp": "2024-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub tasks: BTreeMap<TaskId, Task>,
    #[serde(default)]
    pub completed_tasks: Vec<TaskId>,
    pub timestamp: DateTime<Utc>,
}

/// Reads and writes [`QueueSnapshot`]s at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_fs(path, Arc::new(RealFileSystem))
    }

    pub fn with_fs(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `Ok(None)` when no file exists yet.
    pub fn load(&self) -> Result<Option<QueueSnapshot>> {
        if !self.fs.exists(&self.path) {
            info!(path = ?self.path, "no persisted queue state found");
            return Ok(None);
        }

        let raw = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| TaskweaveError::Persistence(format!("{e:#}")))?;
        let snapshot: QueueSnapshot = serde_json::from_str(&raw)?;

        info!(
            path = ?self.path,
            tasks = snapshot.tasks.len(),
            saved_at = %snapshot.timestamp,
            "loaded persisted queue state"
        );
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.fs
            .write_atomic(&self.path, &bytes)
            .map_err(|e| TaskweaveError::Persistence(format!("{e:#}")))?;
        debug!(path = ?self.path, tasks = snapshot.tasks.len(), "persisted queue state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::types::{TaskPriority, TaskStatus};

    #[test]
    fn save_then_load_through_mock_fs() {
        let fs = MockFileSystem::new();
        let store = SnapshotStore::with_fs("state/queue.json", Arc::new(fs.clone()));

        let mut task = Task::new("a", "noop").with_priority(TaskPriority::High);
        task.status = TaskStatus::Completed;
        let snapshot = QueueSnapshot {
            tasks: BTreeMap::from([("a".to_string(), task)]),
            completed_tasks: vec!["a".to_string()],
            timestamp: Utc::now(),
        };

        store.save(&snapshot).unwrap();
        let raw = fs.contents("state/queue.json").unwrap();
        assert!(raw.contains("\"status\": \"completed\""));
        assert!(raw.contains("\"priority\": \"high\""));

        assert_eq!(store.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn missing_file_loads_as_none() {
        let store = SnapshotStore::with_fs("nope.json", Arc::new(MockFileSystem::new()));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let fs = MockFileSystem::new();
        fs.add_file("bad.json", "{ not json");
        let store = SnapshotStore::with_fs("bad.json", Arc::new(fs));
        assert!(matches!(store.load(), Err(TaskweaveError::JsonError(_))));
    }

    #[test]
    fn write_failure_maps_to_persistence_error() {
        let fs = MockFileSystem::new();
        fs.set_fail_writes(true);
        let store = SnapshotStore::with_fs("q.json", Arc::new(fs));
        let snapshot = QueueSnapshot {
            tasks: BTreeMap::new(),
            completed_tasks: Vec::new(),
            timestamp: Utc::now(),
        };
        assert!(matches!(
            store.save(&snapshot),
            Err(TaskweaveError::Persistence(_))
        ));
    }
}
