// src/exec/shell.rs

//! Executor that runs `parameters.cmd` through the platform shell.

use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::backend::{ExecutionResult, ExecutorFuture, TaskExecutor};
use crate::queue::Task;

/// Runs each task's `cmd` parameter with `sh -c` (or `cmd /C` on Windows).
///
/// Optional `cwd` parameter sets the working directory. The child is killed
/// when the execution future is dropped, so queue timeouts and cancellation
/// stop the process too.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    /// Intent given to config tasks that do not name one.
    pub const INTENT: &'static str = "shell";

    pub fn new() -> Self {
        Self
    }
}

impl TaskExecutor for ShellExecutor {
    fn execute<'a>(&'a self, task: &'a Task) -> ExecutorFuture<'a> {
        Box::pin(run_shell_task(task))
    }
}

async fn run_shell_task(task: &Task) -> Result<ExecutionResult> {
    let cmd_line = task
        .parameters
        .get("cmd")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("task '{}' has no string `cmd` parameter", task.id))?;

    info!(task = %task.id, intent = %task.intent, cmd = %cmd_line, "starting task process");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    if let Some(cwd) = task.parameters.get("cwd").and_then(Value::as_str) {
        cmd.current_dir(cwd);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = cmd
        .output()
        .await
        .with_context(|| format!("running process for task '{}'", task.id))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    for line in stderr.lines() {
        debug!(task = %task.id, "stderr: {}", line);
    }

    let code = output.status.code().unwrap_or(-1);
    let success = output.status.success();

    info!(task = %task.id, exit_code = code, success, "task process exited");

    Ok(ExecutionResult {
        success,
        output: json!({
            "exit_code": code,
            "stdout": stdout.trim_end(),
        }),
        error: (!success).then(|| {
            let tail = stderr.trim();
            if tail.is_empty() {
                format!("exit code {code}")
            } else {
                format!("exit code {code}: {tail}")
            }
        }),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_of_successful_command() {
        let task = Task::new("echo", "shell").with_parameter("cmd", "echo hello");
        let result = ShellExecutor.execute(&task).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output["stdout"], "hello");
        assert_eq!(result.output["exit_code"], 0);
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let task = Task::new("fail", "shell").with_parameter("cmd", "echo boom >&2; exit 3");
        let result = ShellExecutor.execute(&task).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.output["exit_code"], 3);
        assert_eq!(result.error.as_deref(), Some("exit code 3: boom"));
    }

    #[tokio::test]
    async fn missing_cmd_parameter_is_an_error() {
        let task = Task::new("nocmd", "shell");
        let err = ShellExecutor.execute(&task).await.unwrap_err();
        assert!(err.to_string().contains("no string `cmd` parameter"));
    }
}
