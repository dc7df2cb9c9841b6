#![allow(dead_code)]

pub use taskweave_test_utils::builders;
pub use taskweave_test_utils::fake_executor::{FakeExecutor, Step};
pub use taskweave_test_utils::{init_tracing, with_timeout};

use std::time::Duration;

use taskweave::queue::{QueueOptions, TaskQueue};

/// In-memory queue with a short poll interval.
pub fn memory_queue(max_concurrent: usize) -> TaskQueue {
    TaskQueue::new(QueueOptions {
        max_concurrent,
        poll_interval: Duration::from_millis(10),
        persist_path: None,
    })
}
