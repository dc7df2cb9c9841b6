// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskweaveError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskweaveError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.queue, raw.workflow, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_queue_section(cfg)?;
    validate_workflow_section(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn validate_queue_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.queue.max_concurrent == 0 {
        return Err(TaskweaveError::ConfigError(
            "[queue].max_concurrent must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.queue.poll_interval.is_zero() {
        return Err(TaskweaveError::ConfigError(
            "[queue].poll_interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_workflow_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.workflow.max_parallel == 0 {
        return Err(TaskweaveError::ConfigError(
            "[workflow].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }
    let threshold = cfg.workflow.complexity_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(TaskweaveError::ConfigError(format!(
            "[workflow].complexity_threshold must be within 0.0..=1.0 (got {threshold})"
        )));
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(TaskweaveError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(TaskweaveError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(TaskweaveError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
