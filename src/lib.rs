// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod queue;
pub mod types;
pub mod workflow;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, RunMode};
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::compute_levels;
use crate::errors::TaskweaveError;
use crate::exec::ShellExecutor;
use crate::queue::TaskQueue;
use crate::workflow::{TaskSpec, WorkflowOrchestrator};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task queue or the workflow orchestrator
/// - the shell executor
/// - Ctrl-C handling (queue mode)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    if args.dry_run {
        print_dry_run(&cfg, &args);
        return Ok(());
    }

    match args.mode {
        RunMode::Queue => run_queue(&cfg).await,
        RunMode::Workflow => run_workflow(&cfg, &args).await,
    }
}

async fn run_queue(cfg: &ConfigFile) -> Result<()> {
    let queue = TaskQueue::new(cfg.queue_options());

    for task in cfg.queue_tasks() {
        match queue.add_task(task).await {
            Ok(id) => debug!(task = %id, "queued task from config"),
            Err(TaskweaveError::DuplicateTask(id)) => {
                info!(task = %id, "task already pending from persisted state; keeping it");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let executor = Arc::new(ShellExecutor::new());
    tokio::select! {
        _ = queue.process_queue(executor) => {}
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            info!("shutdown requested; cancelling running tasks");
            for id in queue.running_ids().await {
                queue.cancel_task(&id).await;
            }
        }
    }

    let stats = queue.get_queue_stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn run_workflow(cfg: &ConfigFile, args: &CliArgs) -> Result<()> {
    let orchestrator =
        WorkflowOrchestrator::new(cfg.workflow_settings(), Arc::new(ShellExecutor::new()));

    let report = orchestrator
        .execute_workflow(&args.workflow_id, workflow_steps(cfg), args.strategy)
        .await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.success {
        anyhow::bail!(
            "workflow '{}' did not succeed ({} completed, {} failed)",
            report.workflow_id,
            report.completed,
            report.failed
        );
    }
    Ok(())
}

/// Config tasks as workflow steps, indexed in task id order.
pub fn workflow_steps(cfg: &ConfigFile) -> Vec<TaskSpec> {
    cfg.task
        .iter()
        .enumerate()
        .map(|(index, (id, task))| {
            let mut spec = TaskSpec::new(index, task.step_description())
                .with_dependencies(task.after.iter().filter_map(|dep| cfg.step_index(dep)));
            spec.parameters = task.to_task(id).parameters;
            spec
        })
        .collect()
}

fn print_dry_run(cfg: &ConfigFile, args: &CliArgs) {
    println!("taskweave dry-run");
    println!("  mode = {:?}", args.mode);
    println!("  queue.max_concurrent = {}", cfg.queue.max_concurrent);
    if let Some(path) = &cfg.queue.persist_path {
        println!("  queue.persist_path = {}", path.display());
    }
    println!("  workflow.max_parallel = {}", cfg.workflow.max_parallel);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (id, task) in cfg.task.iter() {
        println!("  - {id}");
        println!("      intent: {}", task.intent);
        println!("      priority: {:?}", task.priority);
        if let Some(cmd) = &task.cmd {
            println!("      cmd: {cmd}");
        }
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if let Some(timeout) = task.timeout {
            println!("      timeout: {timeout:?}");
        }
    }

    if args.mode == RunMode::Workflow {
        let steps = workflow_steps(cfg);
        let names: Vec<&String> = cfg.task.keys().collect();
        println!();
        println!("levels (strategy {:?}):", args.strategy);
        for (level, indices) in compute_levels(&steps).iter().enumerate() {
            let ids: Vec<&str> = indices
                .iter()
                .filter_map(|i| names.get(*i).map(|s| s.as_str()))
                .collect();
            println!("  {level}: {ids:?}");
        }
    }

    debug!("dry-run complete (no execution)");
}
