// src/exec/mod.rs

//! Executor boundary.
//!
//! Everything the scheduling core knows about "doing work" goes through
//! the [`TaskExecutor`] trait.
//!
//! - [`backend`] defines the trait, the [`ExecutionResult`] it returns and
//!   the [`executor_fn`] closure adaptor.
//! - [`shell`] provides [`ShellExecutor`], which the CLI uses to run shell
//!   commands taken from task parameters.

pub mod backend;
pub mod shell;

pub(crate) use backend::execute_catching;
pub use backend::{ExecutionResult, ExecutorFuture, FnExecutor, TaskExecutor, executor_fn};
pub use shell::ShellExecutor;
