use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use serde_json::json;
use tokio::sync::mpsc;
use taskweave::exec::{ExecutionResult, ExecutorFuture, TaskExecutor};
use taskweave::queue::Task;

/// What the fake does on one attempt of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Succeed,
    /// Return `Ok` with `success: false`.
    Fail(String),
    /// Return `Err`.
    Error(String),
    Panic,
}

#[derive(Default)]
struct FakeInner {
    executed: Mutex<Vec<String>>,
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    delays: Mutex<HashMap<String, Duration>>,
    default_delay: Mutex<Duration>,
    running: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

/// A fake executor that:
/// - records which tasks were started, in order
/// - succeeds unless a script for the task id says otherwise
/// - optionally sleeps per task, tracking peak concurrency.
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    inner: Arc<FakeInner>,
}

/// Decrements the running counter even when the attempt is dropped.
struct RunningGuard<'a>(&'a AtomicUsize);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue up outcomes for `task_id`; once exhausted, attempts succeed.
    pub fn script(self, task_id: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.inner
            .scripts
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .extend(steps);
        self
    }

    /// Fail every attempt of `task_id`.
    pub fn always_fail(self, task_id: &str) -> Self {
        self.script(task_id, std::iter::repeat_n(Step::Fail(format!("{task_id} failed")), 64))
    }

    pub fn with_delay(self, task_id: &str, delay: Duration) -> Self {
        self.inner
            .delays
            .lock()
            .unwrap()
            .insert(task_id.to_string(), delay);
        self
    }

    pub fn with_default_delay(self, delay: Duration) -> Self {
        *self.inner.default_delay.lock().unwrap() = delay;
        self
    }

    /// Receive every task id as its attempt starts.
    pub fn start_notifications(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.started.lock().unwrap() = Some(tx);
        rx
    }

    /// Task ids in the order attempts started (retries appear again).
    pub fn executed(&self) -> Vec<String> {
        self.inner.executed.lock().unwrap().clone()
    }

    pub fn attempts(&self, task_id: &str) -> usize {
        self.executed().iter().filter(|id| *id == task_id).count()
    }

    /// Highest number of attempts observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    fn delay_for(&self, task_id: &str) -> Duration {
        self.inner
            .delays
            .lock()
            .unwrap()
            .get(task_id)
            .copied()
            .unwrap_or_else(|| *self.inner.default_delay.lock().unwrap())
    }

    fn next_step(&self, task_id: &str) -> Step {
        self.inner
            .scripts
            .lock()
            .unwrap()
            .get_mut(task_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Succeed)
    }
}

impl TaskExecutor for FakeExecutor {
    fn execute<'a>(&'a self, task: &'a Task) -> ExecutorFuture<'a> {
        Box::pin(async move {
            self.inner.executed.lock().unwrap().push(task.id.clone());
            if let Some(tx) = self.inner.started.lock().unwrap().as_ref() {
                let _ = tx.send(task.id.clone());
            }

            let now = self.inner.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner.peak.fetch_max(now, Ordering::SeqCst);
            let _guard = RunningGuard(&self.inner.running);

            let delay = self.delay_for(&task.id);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.next_step(&task.id) {
                Step::Succeed => Ok(ExecutionResult::ok(json!({ "task": task.id }))),
                Step::Fail(msg) => Ok(ExecutionResult::failed(msg)),
                Step::Error(msg) => Err(anyhow!(msg)),
                Step::Panic => panic!("fake executor panic in {}", task.id),
            }
        })
    }
}
