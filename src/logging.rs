// src/logging.rs

//! Tracing subscriber for the `taskweave` binary.
//!
//! `--log-level` sets the level of this crate's own targets
//! (`taskweave::queue`, `taskweave::workflow`, ...) while dependencies stay
//! at `warn`. Without the flag, `TASKWEAVE_LOG` is read as a full filter, so
//! `TASKWEAVE_LOG=taskweave::queue=debug,taskweave::workflow=trace` narrows
//! output to one component. Logs go to stderr; stdout carries the JSON
//! report.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable read when no CLI level is given.
pub const LOG_ENV_VAR: &str = "TASKWEAVE_LOG";

const DEFAULT_DIRECTIVES: &str = "warn,taskweave=info";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(format!("warn,taskweave={}", level_directive(level)));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => EnvFilter::try_new(spec).unwrap_or_else(|e| {
            eprintln!("ignoring invalid {LOG_ENV_VAR}={spec:?}: {e}");
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }),
        None => EnvFilter::new(DEFAULT_DIRECTIVES),
    }
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
