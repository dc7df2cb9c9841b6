// src/queue/scheduler.rs

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, Mutex, Notify};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::dag::DependencyIndex;
use crate::errors::{Result, TaskweaveError};
use crate::exec::{ExecutionResult, TaskExecutor, execute_catching};
use crate::queue::events::QueueEvent;
use crate::queue::ready_queue::ReadyQueue;
use crate::queue::snapshot::{QueueSnapshot, SnapshotStore};
use crate::queue::task::{Task, TaskId};
use crate::types::TaskStatus;

/// Runtime knobs for a [`TaskQueue`].
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Hard ceiling on simultaneously running tasks.
    pub max_concurrent: usize,
    /// Longest the driver loop sleeps before re-checking for work.
    pub poll_interval: Duration,
    /// Snapshot file; `None` keeps the queue in memory only.
    pub persist_path: Option<PathBuf>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            poll_interval: Duration::from_millis(250),
            persist_path: None,
        }
    }
}

/// Counters returned by [`TaskQueue::get_queue_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total_tasks: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub queue_size: usize,
    pub max_concurrent: usize,
}

/// Cancel handle for one execution attempt.
#[derive(Debug)]
struct InFlight {
    /// Token identifying the attempt that owns the task right now.
    attempt: u64,
    cancel: Option<oneshot::Sender<()>>,
}

/// How an attempt ended, before its effect is applied to the queue.
enum AttemptOutcome {
    Finished(anyhow::Result<ExecutionResult>),
    TimedOut(Duration),
    Cancelled,
}

/// Everything guarded by the queue lock.
#[derive(Debug, Default)]
struct QueueState {
    tasks: HashMap<TaskId, Task>,
    index: DependencyIndex,
    ready: ReadyQueue,
    running: HashSet<TaskId>,
    completed: HashSet<TaskId>,
    in_flight: HashMap<TaskId, InFlight>,
    next_attempt: u64,
    /// Bumped on every mutation; orders snapshot writes.
    generation: u64,
    events: Option<mpsc::Sender<QueueEvent>>,
}

impl QueueState {
    fn deps_satisfied(&self, task: &Task) -> bool {
        task.dependencies.iter().all(|d| self.completed.contains(d))
    }

    /// Enqueue every pending dependent of `finished` whose dependencies are
    /// now all complete.
    fn wake_dependents(&mut self, finished: &str) {
        for dependent in self.index.dependents_of(finished) {
            let Some(task) = self.tasks.get(&dependent) else {
                continue;
            };
            if task.status == TaskStatus::Pending && self.deps_satisfied(task) {
                let priority = task.priority;
                if self.ready.push(priority, dependent.clone()) {
                    info!(task = %dependent, "dependencies satisfied; task now ready");
                }
            }
        }
    }

    fn emit(&self, event: QueueEvent) {
        let Some(tx) = &self.events else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(task = %event.task(), "queue event channel full; dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("queue event receiver dropped");
            }
        }
    }

    fn snapshot(&self) -> QueueSnapshot {
        let mut completed: Vec<TaskId> = self.completed.iter().cloned().collect();
        completed.sort();
        QueueSnapshot {
            tasks: self
                .tasks
                .iter()
                .map(|(id, t)| (id.clone(), t.clone()))
                .collect(),
            completed_tasks: completed,
            timestamp: Utc::now(),
        }
    }

    /// Rebuild in-memory indexes from a loaded snapshot.
    fn restore(&mut self, snapshot: QueueSnapshot) {
        self.completed = snapshot.completed_tasks.into_iter().collect();

        let mut tasks: Vec<Task> = snapshot.tasks.into_values().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut arrival = Vec::with_capacity(tasks.len());
        for mut task in tasks {
            if task.status == TaskStatus::Running {
                warn!(task = %task.id, "task was running when state was saved; resetting to pending");
                task.status = TaskStatus::Pending;
                task.started_at = None;
            }
            if task.status == TaskStatus::Completed {
                self.completed.insert(task.id.clone());
            }
            self.index.register(&task.id, &task.dependencies);
            arrival.push(task.id.clone());
            self.tasks.insert(task.id.clone(), task);
        }

        for id in arrival {
            let Some(task) = self.tasks.get(&id) else {
                continue;
            };
            if task.status == TaskStatus::Pending && self.deps_satisfied(task) {
                let priority = task.priority;
                self.ready.push(priority, id);
            }
        }
    }
}

struct Inner {
    state: Mutex<QueueState>,
    /// Signalled whenever work may have become available (new ready task or
    /// freed running slot).
    changed: Notify,
    max_concurrent: usize,
    poll_interval: Duration,
    store: Option<SnapshotStore>,
    /// Generation of the newest snapshot on disk. Also serialises writers.
    written: Mutex<u64>,
}

/// Snapshot captured under the state lock, written after it is released.
struct PendingWrite {
    generation: u64,
    snapshot: QueueSnapshot,
}

/// Persistent, priority- and dependency-aware task queue.
///
/// Responsibilities:
/// - dependency gating: a task only becomes ready once every dependency is
///   `Completed`
/// - priority ordering of ready tasks (ties in arrival order)
/// - bounded concurrency in [`process_queue`](Self::process_queue)
/// - retries, timeouts and cancellation of individual executions
/// - snapshotting state after every mutation
///
/// Cloning is cheap; clones share the same queue.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("max_concurrent", &self.inner.max_concurrent)
            .field("poll_interval", &self.inner.poll_interval)
            .field("store", &self.inner.store)
            .finish_non_exhaustive()
    }
}

impl TaskQueue {
    /// Build a queue, loading persisted state from `options.persist_path` if
    /// the file exists.
    pub fn new(options: QueueOptions) -> Self {
        let store = options.persist_path.clone().map(SnapshotStore::new);
        Self::with_snapshot_store(options, store)
    }

    /// Like [`new`](Self::new) but with an explicit snapshot store (which
    /// takes precedence over `options.persist_path`).
    pub fn with_snapshot_store(options: QueueOptions, store: Option<SnapshotStore>) -> Self {
        let mut state = QueueState::default();

        if let Some(store) = &store {
            match store.load() {
                Ok(Some(snapshot)) => state.restore(snapshot),
                Ok(None) => {}
                Err(e) => error!(error = %e, "failed to load queue state; starting empty"),
            }
        }

        let max_concurrent = options.max_concurrent.max(1);
        info!(max_concurrent, "task queue initialised");

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                changed: Notify::new(),
                max_concurrent,
                poll_interval: options.poll_interval,
                store,
                written: Mutex::new(0),
            }),
        }
    }

    /// Route [`QueueEvent`]s to a new channel, replacing any previous sink.
    pub async fn subscribe(&self, capacity: usize) -> mpsc::Receiver<QueueEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.inner.state.lock().await.events = Some(tx);
        rx
    }

    /// Store `task` and enqueue it if its dependencies are already complete.
    ///
    /// An id whose current record is still live (pending or running) is
    /// rejected with [`TaskweaveError::DuplicateTask`]. A terminal record is
    /// replaced, including its dependency edges.
    pub async fn add_task(&self, mut task: Task) -> Result<TaskId> {
        let mut guard = self.inner.state.lock().await;
        let st = &mut *guard;

        if let Some(existing) = st.tasks.get(&task.id) {
            if !existing.is_terminal() {
                return Err(TaskweaveError::DuplicateTask(task.id));
            }
            debug!(task = %task.id, status = %existing.status, "replacing terminal task record");
            let old_deps = existing.dependencies.clone();
            st.index.unregister(&task.id, &old_deps);
            st.completed.remove(&task.id);
            st.ready.remove(&task.id);
        }

        task.status = TaskStatus::Pending;
        task.started_at = None;
        task.completed_at = None;

        let id = task.id.clone();
        st.index.register(&id, &task.dependencies);

        if st.deps_satisfied(&task) {
            st.ready.push(task.priority, id.clone());
            info!(task = %id, priority = ?task.priority, "task added to ready queue");
        } else {
            info!(task = %id, dependencies = ?task.dependencies, "task waiting for dependencies");
        }
        st.tasks.insert(id.clone(), task);

        let pending = self.capture(st);
        drop(guard);
        self.inner.changed.notify_one();
        self.write_snapshot(pending).await;

        Ok(id)
    }

    /// Execute one task now with `executor`.
    ///
    /// - Success: `Completed`, dependents re-checked.
    /// - Timeout: `Timeout` (terminal), returns [`TaskweaveError::Timeout`].
    /// - Failure with retries left: back to `Pending` and re-queued,
    ///   returns [`TaskweaveError::RetryScheduled`].
    /// - Failure with retries exhausted: `Failed`, returns
    ///   [`TaskweaveError::ExecutionFailed`].
    ///
    /// State is persisted whatever the outcome.
    pub async fn execute_task<E>(&self, task_id: &str, executor: &E) -> Result<ExecutionResult>
    where
        E: TaskExecutor + ?Sized,
    {
        let (task, attempt, cancel_rx) = {
            let mut guard = self.inner.state.lock().await;
            begin_execution(&mut guard, task_id)?
        };
        self.run_attempt(task, attempt, cancel_rx, executor).await
    }

    /// Drive the queue until it is empty and nothing is running.
    ///
    /// Ready tasks are started in priority order, each in its own Tokio task,
    /// never exceeding `max_concurrent` at once. Errors from individual
    /// executions are logged; retries happen through the per-task retry
    /// budget. Intended to be driven by one caller at a time.
    ///
    /// Returns only after every spawned attempt has settled and persisted.
    /// Dropping the future aborts attempts still in flight, leaving them
    /// `Running`; call [`cancel_task`](Self::cancel_task) on
    /// [`running_ids`](Self::running_ids) to record the shutdown.
    pub async fn process_queue<E>(&self, executor: Arc<E>)
    where
        E: TaskExecutor + ?Sized + 'static,
    {
        info!(max_concurrent = self.inner.max_concurrent, "starting queue processor");
        let mut attempts = JoinSet::new();

        loop {
            let next = {
                let mut guard = self.inner.state.lock().await;
                let st = &mut *guard;

                if st.running.len() >= self.inner.max_concurrent {
                    DriverStep::Wait
                } else {
                    match st.ready.pop() {
                        Some((_priority, id)) => {
                            let runnable = !st.completed.contains(&id)
                                && st
                                    .tasks
                                    .get(&id)
                                    .is_some_and(|t| t.status == TaskStatus::Pending);
                            if !runnable {
                                debug!(task = %id, "skipping dequeued task that is no longer pending");
                                DriverStep::Skip
                            } else {
                                match begin_execution(st, &id) {
                                    Ok(started) => DriverStep::Spawn(started),
                                    Err(e) => {
                                        warn!(task = %id, error = %e, "dequeued task could not start");
                                        DriverStep::Skip
                                    }
                                }
                            }
                        }
                        None if st.running.is_empty() => DriverStep::Finish,
                        None => DriverStep::Wait,
                    }
                }
            };

            match next {
                DriverStep::Spawn((task, attempt, cancel_rx)) => {
                    let queue = self.clone();
                    let executor = Arc::clone(&executor);
                    attempts.spawn(async move {
                        let id = task.id.clone();
                        match queue.run_attempt(task, attempt, cancel_rx, executor.as_ref()).await {
                            Ok(_) => {}
                            Err(TaskweaveError::Cancelled(_)) => {
                                debug!(task = %id, "execution stopped by cancellation");
                            }
                            Err(e) if !e.is_terminal() => {
                                warn!(task = %id, error = %e, "attempt failed; retry queued");
                            }
                            Err(e) => {
                                error!(task = %id, error = %e, "task execution error");
                            }
                        }
                    });
                }
                DriverStep::Skip => {}
                DriverStep::Wait => {
                    while let Some(joined) = attempts.try_join_next() {
                        log_join_error(joined);
                    }
                    let _ = tokio::time::timeout(
                        self.inner.poll_interval,
                        self.inner.changed.notified(),
                    )
                    .await;
                }
                DriverStep::Finish => {
                    info!("queue empty and no running tasks");
                    break;
                }
            }
        }

        // Let the last attempts finish persisting before returning.
        while let Some(joined) = attempts.join_next().await {
            log_join_error(joined);
        }

        info!("queue processor finished");
    }

    /// Cancel a pending or running task.
    ///
    /// Returns `false` if the id is unknown or the task is already terminal.
    /// Dependents of a cancelled task are left waiting.
    pub async fn cancel_task(&self, task_id: &str) -> bool {
        let mut guard = self.inner.state.lock().await;
        let st = &mut *guard;

        let Some(task) = st.tasks.get_mut(task_id) else {
            return false;
        };

        match task.status {
            TaskStatus::Pending => {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(Utc::now());
                st.ready.remove(task_id);
                info!(task = %task_id, "task cancelled");
            }
            TaskStatus::Running => {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(Utc::now());
                if let Some(mut flight) = st.in_flight.remove(task_id) {
                    if let Some(cancel) = flight.cancel.take() {
                        if cancel.send(()).is_err() {
                            debug!(task = %task_id, "execution already finished while cancelling");
                        }
                    }
                }
                st.running.remove(task_id);
                info!(task = %task_id, "running task cancelled");
            }
            _ => return false,
        }

        st.emit(QueueEvent::TaskCancelled {
            task: task_id.to_string(),
        });
        let pending = self.capture(st);
        drop(guard);
        self.inner.changed.notify_one();
        self.write_snapshot(pending).await;
        true
    }

    pub async fn get_queue_stats(&self) -> QueueStats {
        let st = self.inner.state.lock().await;
        let count = |status: TaskStatus| st.tasks.values().filter(|t| t.status == status).count();

        QueueStats {
            total_tasks: st.tasks.len(),
            pending: count(TaskStatus::Pending),
            running: st.running.len(),
            completed: st.completed.len(),
            failed: count(TaskStatus::Failed),
            queue_size: st.ready.len(),
            max_concurrent: self.inner.max_concurrent,
        }
    }

    /// Drop every `Completed` task. Returns how many were removed.
    pub async fn clear_completed(&self) -> usize {
        let mut guard = self.inner.state.lock().await;
        let st = &mut *guard;

        let to_remove: Vec<TaskId> = st
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| t.id.clone())
            .collect();

        for id in &to_remove {
            if let Some(task) = st.tasks.remove(id) {
                st.index.unregister(id, &task.dependencies);
            }
            st.completed.remove(id);
        }

        info!(cleared = to_remove.len(), "cleared completed tasks");
        let pending = self.capture(st);
        drop(guard);
        self.write_snapshot(pending).await;
        to_remove.len()
    }

    pub async fn task(&self, task_id: &str) -> Option<Task> {
        self.inner.state.lock().await.tasks.get(task_id).cloned()
    }

    pub async fn task_status(&self, task_id: &str) -> Option<TaskStatus> {
        self.inner
            .state
            .lock()
            .await
            .tasks
            .get(task_id)
            .map(|t| t.status)
    }

    pub async fn tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        let st = self.inner.state.lock().await;
        let mut tasks: Vec<Task> = st
            .tasks
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    pub async fn tasks_by_tag(&self, tag: &str) -> Vec<Task> {
        let st = self.inner.state.lock().await;
        let mut tasks: Vec<Task> = st.tasks.values().filter(|t| t.has_tag(tag)).cloned().collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    /// Ids currently in the ready queue, in dequeue order.
    pub async fn ready_ids(&self) -> Vec<TaskId> {
        self.inner.state.lock().await.ready.ordered_ids()
    }

    /// Ids currently executing.
    pub async fn running_ids(&self) -> Vec<TaskId> {
        let st = self.inner.state.lock().await;
        let mut ids: Vec<TaskId> = st.running.iter().cloned().collect();
        ids.sort();
        ids
    }

    async fn run_attempt<E>(
        &self,
        task: Task,
        attempt: u64,
        mut cancel_rx: oneshot::Receiver<()>,
        executor: &E,
    ) -> Result<ExecutionResult>
    where
        E: TaskExecutor + ?Sized,
    {
        info!(task = %task.id, intent = %task.intent, "executing task");

        let outcome = {
            let run = async {
                match task.timeout {
                    Some(limit) => {
                        match tokio::time::timeout(limit, execute_catching(executor, &task)).await {
                            Ok(res) => AttemptOutcome::Finished(res),
                            Err(_) => AttemptOutcome::TimedOut(limit),
                        }
                    }
                    None => AttemptOutcome::Finished(execute_catching(executor, &task).await),
                }
            };

            tokio::select! {
                outcome = run => outcome,
                _ = &mut cancel_rx => AttemptOutcome::Cancelled,
            }
        };

        let (result, pending) = {
            let mut guard = self.inner.state.lock().await;
            let result = finish_execution(&mut guard, &task.id, attempt, outcome);
            (result, self.capture(&mut guard))
        };
        self.inner.changed.notify_one();
        self.write_snapshot(pending).await;
        result
    }

    /// Stamp a new generation and copy the state for writing. Must be called
    /// with the state lock held.
    fn capture(&self, st: &mut QueueState) -> Option<PendingWrite> {
        self.inner.store.as_ref()?;
        st.generation += 1;
        Some(PendingWrite {
            generation: st.generation,
            snapshot: st.snapshot(),
        })
    }

    /// Write a captured snapshot on the blocking pool unless a newer one has
    /// already landed. Failures are logged and otherwise ignored; in-memory
    /// state stays authoritative.
    async fn write_snapshot(&self, pending: Option<PendingWrite>) {
        let (Some(store), Some(pending)) = (&self.inner.store, pending) else {
            return;
        };

        let mut written = self.inner.written.lock().await;
        if pending.generation <= *written {
            debug!(generation = pending.generation, "newer snapshot already written; skipping");
            return;
        }

        let store = store.clone();
        let path = store.path().to_path_buf();
        let PendingWrite { generation, snapshot } = pending;
        match tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
            Ok(Ok(())) => *written = generation,
            Ok(Err(e)) => error!(path = ?path, error = %e, "failed to persist queue state"),
            Err(e) => error!(path = ?path, error = %e, "snapshot writer aborted"),
        }
    }
}

fn log_join_error(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "queue attempt task aborted");
    }
}

enum DriverStep {
    Spawn((Task, u64, oneshot::Receiver<()>)),
    Skip,
    Wait,
    Finish,
}

/// Mark `task_id` running and register its cancel handle.
fn begin_execution(
    st: &mut QueueState,
    task_id: &str,
) -> Result<(Task, u64, oneshot::Receiver<()>)> {
    let task = st
        .tasks
        .get(task_id)
        .ok_or_else(|| TaskweaveError::TaskNotFound(task_id.to_string()))?;

    if task.status != TaskStatus::Pending {
        return Err(TaskweaveError::NotRunnable {
            task: task_id.to_string(),
            reason: format!("status is {}", task.status),
        });
    }
    if !st.deps_satisfied(task) {
        let missing: Vec<&String> = task
            .dependencies
            .iter()
            .filter(|d| !st.completed.contains(*d))
            .collect();
        return Err(TaskweaveError::NotRunnable {
            task: task_id.to_string(),
            reason: format!("dependencies not completed: {missing:?}"),
        });
    }

    st.next_attempt += 1;
    let attempt = st.next_attempt;
    let (cancel_tx, cancel_rx) = oneshot::channel();

    st.ready.remove(task_id);
    st.running.insert(task_id.to_string());
    st.in_flight.insert(
        task_id.to_string(),
        InFlight {
            attempt,
            cancel: Some(cancel_tx),
        },
    );

    let task = st
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| TaskweaveError::TaskNotFound(task_id.to_string()))?;
    task.status = TaskStatus::Running;
    task.started_at = Some(Utc::now());
    task.error = None;

    debug!(task = %task_id, attempt, "task marked running");
    Ok((task.clone(), attempt, cancel_rx))
}

/// Apply the outcome of `attempt` to the queue state.
fn finish_execution(
    st: &mut QueueState,
    task_id: &str,
    attempt: u64,
    outcome: AttemptOutcome,
) -> Result<ExecutionResult> {
    let owns_task = st
        .in_flight
        .get(task_id)
        .is_some_and(|f| f.attempt == attempt);
    if !owns_task {
        // Cancelled (or replaced) while running; the canceller already
        // updated the record.
        debug!(task = %task_id, attempt, "discarding outcome of superseded attempt");
        return Err(TaskweaveError::Cancelled(task_id.to_string()));
    }

    st.in_flight.remove(task_id);
    st.running.remove(task_id);

    let Some(task) = st.tasks.get_mut(task_id) else {
        return Err(TaskweaveError::TaskNotFound(task_id.to_string()));
    };

    let failure = match outcome {
        AttemptOutcome::Finished(Ok(result)) if result.success => {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(Utc::now());
            task.result = serde_json::to_value(&result).ok();
            st.completed.insert(task_id.to_string());
            info!(task = %task_id, "task completed successfully");

            st.emit(QueueEvent::TaskCompleted {
                task: task_id.to_string(),
            });
            st.wake_dependents(task_id);
            return Ok(result);
        }
        AttemptOutcome::Finished(Ok(result)) => {
            task.result = serde_json::to_value(&result).ok();
            result.error_message()
        }
        AttemptOutcome::Finished(Err(e)) => format!("{e:#}"),
        AttemptOutcome::TimedOut(limit) => {
            task.status = TaskStatus::Timeout;
            task.completed_at = Some(Utc::now());
            task.error = Some(format!("Task timed out after {limit:?}"));
            error!(task = %task_id, timeout = ?limit, "task timed out");

            st.emit(QueueEvent::TaskTimedOut {
                task: task_id.to_string(),
            });
            return Err(TaskweaveError::Timeout {
                task: task_id.to_string(),
                after: limit,
            });
        }
        AttemptOutcome::Cancelled => {
            task.status = TaskStatus::Cancelled;
            task.completed_at = Some(Utc::now());
            return Err(TaskweaveError::Cancelled(task_id.to_string()));
        }
    };

    task.error = Some(failure.clone());
    error!(task = %task_id, error = %failure, "task failed");

    if task.retry_count < task.max_retries {
        task.retry_count += 1;
        task.status = TaskStatus::Pending;
        let (priority, retry_count) = (task.priority, task.retry_count);
        info!(
            task = %task_id,
            retry = retry_count,
            max_retries = task.max_retries,
            "retrying task"
        );
        st.ready.push(priority, task_id.to_string());
        st.emit(QueueEvent::RetryScheduled {
            task: task_id.to_string(),
            retry_count,
            error: failure.clone(),
        });
        Err(TaskweaveError::RetryScheduled {
            task: task_id.to_string(),
            attempt: retry_count,
            message: failure,
        })
    } else {
        task.status = TaskStatus::Failed;
        task.completed_at = Some(Utc::now());
        st.emit(QueueEvent::TaskFailed {
            task: task_id.to_string(),
            error: failure.clone(),
        });
        Err(TaskweaveError::ExecutionFailed {
            task: task_id.to_string(),
            message: failure,
        })
    }
}
