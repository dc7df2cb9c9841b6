// src/queue/mod.rs

//! Persistent task queue.
//!
//! - [`task`] holds the [`Task`] record and its builders.
//! - [`ready_queue`] orders dequeue-eligible ids by priority.
//! - [`scheduler`] is the [`TaskQueue`] itself: dependency gating,
//!   bounded concurrency, retries, timeouts, cancellation.
//! - [`snapshot`] reads and writes the JSON state file.
//! - [`events`] defines the notifications a subscriber receives.

pub mod events;
pub mod ready_queue;
pub mod scheduler;
pub mod snapshot;
pub mod task;

pub use events::QueueEvent;
pub use ready_queue::ReadyQueue;
pub use scheduler::{QueueOptions, QueueStats, TaskQueue};
pub use snapshot::{QueueSnapshot, SnapshotStore};
pub use task::{Task, TaskId};
