// src/workflow/orchestrator.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dag::{compute_levels, topological_order};
use crate::exec::{ExecutionResult, TaskExecutor};
use crate::queue::Task;
use crate::types::{StepStatus, Strategy};
use crate::workflow::analysis::{ExecutionPlan, WorkflowAnalysis};
use crate::workflow::TaskSpec;

/// Orchestrator behaviour, normally read from the `[workflow]` config
/// section.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    /// Largest batch started concurrently within one level.
    pub max_parallel: usize,
    pub retry_failed: bool,
    pub max_retries: u32,
    /// Keep going after a failed step in sequential runs.
    pub continue_on_failure: bool,
    /// Base delay; attempt `n` waits `2^n` units before retrying.
    pub backoff_unit: Duration,
    pub complexity_threshold: f64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_parallel: 3,
            retry_failed: true,
            max_retries: 2,
            continue_on_failure: false,
            backoff_unit: Duration::from_secs(1),
            complexity_threshold: 0.7,
        }
    }
}

impl WorkflowSettings {
    /// Retries actually granted per step.
    pub fn effective_max_retries(&self) -> u32 {
        if self.retry_failed {
            self.max_retries
        } else {
            0
        }
    }
}

/// Outcome of [`WorkflowOrchestrator::execute_workflow`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowReport {
    pub workflow_id: String,
    pub strategy: Strategy,
    /// `completed > 0 && failed == 0`.
    pub success: bool,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
    /// Wall-clock time, reported as fractional seconds.
    #[serde(rename = "duration_seconds", serialize_with = "serialize_seconds")]
    pub duration: Duration,
    pub results: BTreeMap<usize, ExecutionResult>,
    pub status: BTreeMap<usize, StepStatus>,
}

fn serialize_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Live view of an active workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStatus {
    pub id: String,
    pub total_tasks: usize,
    pub completed: usize,
    pub failed: usize,
    pub paused: bool,
    pub status: BTreeMap<usize, StepStatus>,
}

/// A step annotated with the group of steps it may run alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedStep {
    pub spec: TaskSpec,
    /// Steps with identical dependency sets share a group.
    pub parallel_group: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Running,
    Paused,
    Cancelled,
}

#[derive(Debug, Default)]
struct Progress {
    status: BTreeMap<usize, StepStatus>,
    results: BTreeMap<usize, ExecutionResult>,
    completed: usize,
    failed: usize,
    skipped: usize,
}

#[derive(Debug)]
struct ActiveWorkflow {
    id: String,
    total_tasks: usize,
    control: watch::Sender<Control>,
    progress: Mutex<Progress>,
}

impl ActiveWorkflow {
    fn new(id: &str, tasks: &[TaskSpec]) -> Self {
        let (control, _) = watch::channel(Control::Running);
        let progress = Progress {
            status: tasks.iter().map(|t| (t.index, StepStatus::Pending)).collect(),
            ..Progress::default()
        };
        Self {
            id: id.to_string(),
            total_tasks: tasks.len(),
            control,
            progress: Mutex::new(progress),
        }
    }

    /// Wait out a pause. Returns `false` once the workflow is cancelled.
    async fn checkpoint(&self) -> bool {
        let mut rx = self.control.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            match current {
                Control::Running => return true,
                Control::Cancelled => return false,
                Control::Paused => debug!(workflow = %self.id, "workflow paused; waiting"),
            }
            if rx.changed().await.is_err() {
                return false;
            }
        }
    }

    async fn set_status(&self, index: usize, status: StepStatus) {
        self.progress.lock().await.status.insert(index, status);
    }

    async fn record(&self, index: usize, result: ExecutionResult) {
        let mut p = self.progress.lock().await;
        if result.success {
            p.status.insert(index, StepStatus::Completed);
            p.completed += 1;
        } else {
            p.status.insert(index, StepStatus::Failed);
            p.failed += 1;
        }
        p.results.insert(index, result);
    }
}

#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    backoff_unit: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor)
    }
}

/// Runs one-shot workflows of [`TaskSpec`]s against an executor.
///
/// Workflow state lives only for the duration of
/// [`execute_workflow`](Self::execute_workflow); while it runs, the workflow
/// can be paused, resumed, cancelled and inspected by id. Cloning is cheap
/// and clones share the set of active workflows.
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    settings: WorkflowSettings,
    executor: Arc<dyn TaskExecutor>,
    active: Arc<Mutex<HashMap<String, Arc<ActiveWorkflow>>>>,
}

impl std::fmt::Debug for WorkflowOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowOrchestrator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl WorkflowOrchestrator {
    pub fn new(settings: WorkflowSettings, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            settings,
            executor,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Execute `tasks` with `strategy` and report the outcome.
    ///
    /// Steps are addressed by their position in `tasks`; dependencies refer
    /// to those positions. Executor errors and panics are folded into
    /// failed results, so this never fails as a whole.
    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        tasks: Vec<TaskSpec>,
        strategy: Strategy,
    ) -> WorkflowReport {
        info!(workflow = %workflow_id, tasks = tasks.len(), ?strategy, "starting workflow");
        let start = Instant::now();

        let tasks = prepare_tasks(workflow_id, tasks);
        let handle = Arc::new(ActiveWorkflow::new(workflow_id, &tasks));
        self.active
            .lock()
            .await
            .insert(workflow_id.to_string(), Arc::clone(&handle));

        let plan = match strategy {
            Strategy::Sequential => ExecutionPlan::Sequential,
            Strategy::Parallel => ExecutionPlan::ParallelByLevel,
            Strategy::Adaptive => {
                let analysis = WorkflowAnalysis::analyze(&tasks);
                let plan = analysis.plan(self.settings.complexity_threshold);
                info!(
                    workflow = %workflow_id,
                    has_dependencies = analysis.has_dependencies,
                    avg_complexity = analysis.avg_task_complexity,
                    ?plan,
                    "adaptive strategy selected plan"
                );
                plan
            }
        };

        match plan {
            ExecutionPlan::Sequential => self.run_sequential(&handle, &tasks).await,
            ExecutionPlan::ParallelByLevel | ExecutionPlan::FullParallel => {
                self.run_parallel(&handle, &tasks).await
            }
        }

        {
            let mut active = self.active.lock().await;
            if active
                .get(workflow_id)
                .is_some_and(|h| Arc::ptr_eq(h, &handle))
            {
                active.remove(workflow_id);
            }
        }

        let cancelled = *handle.control.borrow() == Control::Cancelled;
        let progress = std::mem::take(&mut *handle.progress.lock().await);
        let duration = start.elapsed();
        let success = progress.completed > 0 && progress.failed == 0;

        info!(
            workflow = %workflow_id,
            success,
            completed = progress.completed,
            failed = progress.failed,
            skipped = progress.skipped,
            cancelled,
            ?duration,
            "workflow finished"
        );

        WorkflowReport {
            workflow_id: workflow_id.to_string(),
            strategy,
            success,
            completed: progress.completed,
            failed: progress.failed,
            skipped: progress.skipped,
            cancelled,
            duration,
            results: progress.results,
            status: progress.status,
        }
    }

    /// Stop starting new steps in `workflow_id` until resumed.
    ///
    /// Returns `false` if no such workflow is active.
    pub async fn pause_workflow(&self, workflow_id: &str) -> bool {
        let Some(handle) = self.lookup(workflow_id).await else {
            return false;
        };
        info!(workflow = %workflow_id, "pausing workflow");
        handle.control.send_if_modified(|c| {
            if *c == Control::Running {
                *c = Control::Paused;
                true
            } else {
                false
            }
        });
        true
    }

    pub async fn resume_workflow(&self, workflow_id: &str) -> bool {
        let Some(handle) = self.lookup(workflow_id).await else {
            return false;
        };
        info!(workflow = %workflow_id, "resuming workflow");
        handle.control.send_if_modified(|c| {
            if *c == Control::Paused {
                *c = Control::Running;
                true
            } else {
                false
            }
        });
        true
    }

    /// Stop `workflow_id` after the steps already started finish. Steps not
    /// yet started stay `Pending`.
    pub async fn cancel_workflow(&self, workflow_id: &str) -> bool {
        let Some(handle) = self.lookup(workflow_id).await else {
            return false;
        };
        info!(workflow = %workflow_id, "cancelling workflow");
        handle.control.send_replace(Control::Cancelled);
        true
    }

    pub async fn workflow_status(&self, workflow_id: &str) -> Option<WorkflowStatus> {
        let handle = self.lookup(workflow_id).await?;
        let paused = *handle.control.borrow() == Control::Paused;
        let p = handle.progress.lock().await;
        Some(WorkflowStatus {
            id: handle.id.clone(),
            total_tasks: handle.total_tasks,
            completed: p.completed,
            failed: p.failed,
            paused,
            status: p.status.clone(),
        })
    }

    /// Ids of workflows currently executing.
    pub async fn active_workflows(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Reorder `tasks` so dependencies come first, and tag steps that can
    /// share a batch.
    pub fn optimize_workflow(&self, tasks: &[TaskSpec]) -> Vec<OptimizedStep> {
        info!(tasks = tasks.len(), "optimizing workflow");

        let by_index: HashMap<usize, &TaskSpec> = tasks.iter().map(|t| (t.index, t)).collect();
        let ordered: Vec<&TaskSpec> = topological_order(tasks)
            .into_iter()
            .filter_map(|i| by_index.get(&i).copied())
            .collect();

        let mut steps: Vec<OptimizedStep> = Vec::with_capacity(ordered.len());
        for (position, spec) in ordered.into_iter().enumerate() {
            let mut deps = spec.dependencies.clone();
            deps.sort_unstable();
            deps.dedup();

            let parallel_group = steps
                .iter()
                .find(|s| {
                    let mut other = s.spec.dependencies.clone();
                    other.sort_unstable();
                    other.dedup();
                    other == deps
                })
                .map(|s| s.parallel_group)
                .unwrap_or(position);

            steps.push(OptimizedStep {
                spec: spec.clone(),
                parallel_group,
            });
        }
        steps
    }

    async fn lookup(&self, workflow_id: &str) -> Option<Arc<ActiveWorkflow>> {
        self.active.lock().await.get(workflow_id).cloned()
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.settings.effective_max_retries(),
            backoff_unit: self.settings.backoff_unit,
        }
    }

    async fn run_sequential(&self, handle: &ActiveWorkflow, tasks: &[TaskSpec]) {
        info!(workflow = %handle.id, "executing workflow sequentially");
        let policy = self.retry_policy();

        for spec in tasks {
            if !handle.checkpoint().await {
                info!(workflow = %handle.id, "workflow cancelled; not starting further steps");
                break;
            }

            let deps_met = {
                let p = handle.progress.lock().await;
                spec.dependencies
                    .iter()
                    .all(|d| p.status.get(d) == Some(&StepStatus::Completed))
            };
            if !deps_met {
                warn!(workflow = %handle.id, step = spec.index, "dependencies not met; skipping step");
                let mut p = handle.progress.lock().await;
                p.status.insert(spec.index, StepStatus::Skipped);
                p.skipped += 1;
                continue;
            }

            handle.set_status(spec.index, StepStatus::Running).await;
            let step = tokio::spawn(run_step(
                Arc::clone(&self.executor),
                spec.to_task(&handle.id),
                policy,
            ));
            let result = join_step(&handle.id, spec.index, step).await;
            let succeeded = result.success;
            handle.record(spec.index, result).await;

            if !succeeded && !self.settings.continue_on_failure {
                warn!(workflow = %handle.id, step = spec.index, "stopping workflow due to step failure");
                break;
            }
        }
    }

    async fn run_parallel(&self, handle: &ActiveWorkflow, tasks: &[TaskSpec]) {
        info!(workflow = %handle.id, "executing workflow in parallel by level");
        let policy = self.retry_policy();
        let batch_size = self.settings.max_parallel.max(1);
        let levels = compute_levels(tasks);

        'levels: for (level, indices) in levels.iter().enumerate() {
            info!(workflow = %handle.id, level, tasks = indices.len(), "executing level");

            for batch in indices.chunks(batch_size) {
                if !handle.checkpoint().await {
                    info!(workflow = %handle.id, "workflow cancelled; not starting further batches");
                    break 'levels;
                }

                let mut running = Vec::with_capacity(batch.len());
                for &index in batch {
                    let Some(spec) = tasks.get(index) else {
                        continue;
                    };
                    handle.set_status(index, StepStatus::Running).await;
                    let executor = Arc::clone(&self.executor);
                    let task = spec.to_task(&handle.id);
                    running.push((index, tokio::spawn(run_step(executor, task, policy))));
                }

                for (index, step) in running {
                    let result = join_step(&handle.id, index, step).await;
                    handle.record(index, result).await;
                }
            }
        }
    }
}

/// Give every step its positional index.
fn prepare_tasks(workflow_id: &str, tasks: Vec<TaskSpec>) -> Vec<TaskSpec> {
    tasks
        .into_iter()
        .enumerate()
        .map(|(position, mut spec)| {
            if spec.index != position {
                warn!(
                    workflow = %workflow_id,
                    given = spec.index,
                    position,
                    "step index does not match its position; using position"
                );
                spec.index = position;
            }
            spec
        })
        .collect()
}

/// Wait for a spawned step; a panic or abort becomes a failed result.
async fn join_step(
    workflow_id: &str,
    index: usize,
    step: JoinHandle<ExecutionResult>,
) -> ExecutionResult {
    match step.await {
        Ok(result) => result,
        Err(e) => {
            error!(workflow = %workflow_id, step = index, error = %e, "step aborted");
            ExecutionResult::failed(format!("step aborted: {e}"))
        }
    }
}

/// Execute one step with retries and exponential backoff.
async fn run_step(
    executor: Arc<dyn TaskExecutor>,
    task: Task,
    policy: RetryPolicy,
) -> ExecutionResult {
    info!(step = %task.id, description = %task.intent, "executing step");

    let mut attempt = 0u32;
    loop {
        let failure = match executor.execute(&task).await {
            Ok(result) if result.success => {
                info!(step = %task.id, "step completed successfully");
                return result;
            }
            Ok(result) => {
                warn!(step = %task.id, error = %result.error_message(), "step failed");
                result
            }
            Err(e) => {
                error!(step = %task.id, error = %e, "step raised an error");
                ExecutionResult::failed(format!("{e:#}"))
            }
        };

        if attempt >= policy.max_retries {
            return failure;
        }

        let wait = policy.delay(attempt);
        attempt += 1;
        info!(
            step = %task.id,
            attempt,
            max_retries = policy.max_retries,
            ?wait,
            "retrying step after backoff"
        );
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_disabled_grants_none() {
        let settings = WorkflowSettings {
            retry_failed: false,
            ..WorkflowSettings::default()
        };
        assert_eq!(settings.effective_max_retries(), 0);
        assert_eq!(WorkflowSettings::default().effective_max_retries(), 2);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff_unit: Duration::from_millis(10),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(1), Duration::from_millis(20));
        assert_eq!(policy.delay(3), Duration::from_millis(80));
    }

    #[test]
    fn report_duration_is_serialized_in_seconds() {
        let report = WorkflowReport {
            workflow_id: "wf".to_string(),
            strategy: Strategy::Sequential,
            success: true,
            completed: 1,
            failed: 0,
            skipped: 0,
            cancelled: false,
            duration: Duration::from_millis(1500),
            results: BTreeMap::new(),
            status: BTreeMap::from([(0, StepStatus::Completed)]),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["duration_seconds"], 1.5);
        assert!(json.get("duration").is_none());
        assert_eq!(json["status"]["0"], "completed");
    }

    #[test]
    fn prepare_tasks_renumbers_by_position() {
        let tasks = prepare_tasks("wf", vec![TaskSpec::new(5, "a"), TaskSpec::new(1, "b")]);
        let indices: Vec<usize> = tasks.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
