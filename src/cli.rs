// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::Strategy;

/// Command-line arguments for `taskweave`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskweave",
    version,
    about = "Run prioritised, dependency-aware task queues and workflows.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Taskweave.toml")]
    pub config: String,

    /// Drive the persistent queue, or run the tasks once as a workflow.
    #[arg(long, value_enum, default_value_t = RunMode::Queue)]
    pub mode: RunMode,

    /// Workflow strategy (only used with `--mode workflow`).
    #[arg(long, value_enum, default_value_t = Strategy::Adaptive)]
    pub strategy: Strategy,

    /// Id used to label the workflow run.
    #[arg(long, value_name = "ID", default_value = "cli")]
    pub workflow_id: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKWEAVE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Queue,
    Workflow,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_queue_mode_and_adaptive_strategy() {
        let args = CliArgs::try_parse_from(["taskweave"]).unwrap();
        assert_eq!(args.config, "Taskweave.toml");
        assert_eq!(args.mode, RunMode::Queue);
        assert_eq!(args.strategy, Strategy::Adaptive);
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_workflow_flags() {
        let args = CliArgs::try_parse_from([
            "taskweave",
            "--config",
            "jobs.toml",
            "--mode",
            "workflow",
            "--strategy",
            "parallel",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.config, "jobs.toml");
        assert_eq!(args.mode, RunMode::Workflow);
        assert_eq!(args.strategy, Strategy::Parallel);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
