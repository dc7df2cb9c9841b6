// src/queue/events.rs

use crate::queue::task::TaskId;

/// Notifications emitted by the queue as tasks reach notable states.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    TaskCompleted {
        task: TaskId,
    },
    /// A failed attempt was re-queued.
    RetryScheduled {
        task: TaskId,
        retry_count: u32,
        error: String,
    },
    /// Retries exhausted; the task is terminally failed.
    TaskFailed {
        task: TaskId,
        error: String,
    },
    TaskTimedOut {
        task: TaskId,
    },
    TaskCancelled {
        task: TaskId,
    },
}

impl QueueEvent {
    pub fn task(&self) -> &str {
        match self {
            QueueEvent::TaskCompleted { task }
            | QueueEvent::RetryScheduled { task, .. }
            | QueueEvent::TaskFailed { task, .. }
            | QueueEvent::TaskTimedOut { task }
            | QueueEvent::TaskCancelled { task } => task,
        }
    }
}
