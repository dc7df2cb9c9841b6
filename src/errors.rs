// src/errors.rs

//! Crate-wide error type and result alias.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskweaveError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task already queued: {0}")]
    DuplicateTask(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Task {task} timed out after {after:?}")]
    Timeout { task: String, after: Duration },

    #[error("Task {task} failed: {message}")]
    ExecutionFailed { task: String, message: String },

    #[error("Task {task} failed (retry {attempt} scheduled): {message}")]
    RetryScheduled {
        task: String,
        attempt: u32,
        message: String,
    },

    #[error("Task {task} cannot run: {reason}")]
    NotRunnable { task: String, reason: String },

    #[error("Task {0} was cancelled")]
    Cancelled(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskweaveError {
    /// True for errors that leave the task in a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskweaveError::RetryScheduled { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskweaveError>;
