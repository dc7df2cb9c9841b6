// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The queue and the orchestrator talk to a [`TaskExecutor`] and never look
//! inside it. Production code plugs in [`ShellExecutor`](super::ShellExecutor)
//! or an integration layer of its own; tests use [`executor_fn`] with an
//! async closure.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::queue::Task;

/// What an executor reports back for one attempt.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn ok(output: impl Into<Value>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(error.into()),
        }
    }

    /// Error text for a failed result, or a generic message.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "executor reported failure".to_string())
    }
}

pub type ExecutorFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<ExecutionResult>> + Send + 'a>>;

/// Trait abstracting how a task is actually performed.
///
/// Returning `Err` means the executor raised; returning
/// `Ok(ExecutionResult { success: false, .. })` means it ran and reported a
/// failure. Both count as failed attempts.
pub trait TaskExecutor: Send + Sync {
    fn execute<'a>(&'a self, task: &'a Task) -> ExecutorFuture<'a>;
}

impl<T: TaskExecutor + ?Sized> TaskExecutor for Arc<T> {
    fn execute<'a>(&'a self, task: &'a Task) -> ExecutorFuture<'a> {
        (**self).execute(task)
    }
}

/// Run one attempt of `task`, turning a panic inside the executor into an
/// error so the caller can still settle the task.
pub(crate) async fn execute_catching<E>(executor: &E, task: &Task) -> anyhow::Result<ExecutionResult>
where
    E: TaskExecutor + ?Sized,
{
    let attempt = AssertUnwindSafe(async { executor.execute(task).await });
    match attempt.catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(anyhow!("executor panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Executor backed by an async closure that receives an owned task view.
#[derive(Clone)]
pub struct FnExecutor<F> {
    f: F,
}

/// Wrap an async closure as a [`TaskExecutor`].
pub fn executor_fn<F, Fut>(f: F) -> FnExecutor<F>
where
    F: Fn(Task) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ExecutionResult>> + Send + 'static,
{
    FnExecutor { f }
}

impl<F, Fut> TaskExecutor for FnExecutor<F>
where
    F: Fn(Task) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ExecutionResult>> + Send + 'static,
{
    fn execute<'a>(&'a self, task: &'a Task) -> ExecutorFuture<'a> {
        Box::pin((self.f)(task.clone()))
    }
}
