// tests/queue_lifecycle.rs

mod common;
use crate::common::{FakeExecutor, Step, init_tracing, memory_queue, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use taskweave::errors::TaskweaveError;
use taskweave::queue::{QueueEvent, Task};
use taskweave::types::{TaskPriority, TaskStatus};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn task_succeeds_on_third_attempt_within_retry_budget() -> TestResult {
    init_tracing();

    let queue = memory_queue(1);
    queue
        .add_task(Task::new("flaky", "noop").with_max_retries(2))
        .await?;

    let executor = FakeExecutor::new().script(
        "flaky",
        [Step::Fail("first".into()), Step::Error("second".into())],
    );

    match queue.execute_task("flaky", &executor).await {
        Err(TaskweaveError::RetryScheduled { attempt, message, .. }) => {
            assert_eq!(attempt, 1);
            assert_eq!(message, "first");
        }
        other => panic!("expected RetryScheduled, got {other:?}"),
    }
    assert_eq!(queue.task_status("flaky").await, Some(TaskStatus::Pending));
    assert_eq!(queue.ready_ids().await, vec!["flaky"]);

    match queue.execute_task("flaky", &executor).await {
        Err(TaskweaveError::RetryScheduled { attempt, message, .. }) => {
            assert_eq!(attempt, 2);
            assert!(message.contains("second"));
        }
        other => panic!("expected RetryScheduled, got {other:?}"),
    }

    let result = queue.execute_task("flaky", &executor).await?;
    assert!(result.success);

    let task = queue.task("flaky").await.ok_or("task missing")?;
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.retry_count, 2);
    assert_eq!(executor.attempts("flaky"), 3);
    Ok(())
}

#[tokio::test]
async fn exhausted_retries_leave_task_failed() -> TestResult {
    init_tracing();

    let queue = memory_queue(1);
    queue
        .add_task(Task::new("broken", "noop").with_max_retries(2))
        .await?;
    queue
        .add_task(Task::new("after", "noop").with_dependency("broken"))
        .await?;

    let executor = Arc::new(FakeExecutor::new().always_fail("broken"));
    with_timeout(queue.process_queue(Arc::clone(&executor))).await;

    let task = queue.task("broken").await.ok_or("task missing")?;
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.retry_count, 2);
    assert_eq!(task.error.as_deref(), Some("broken failed"));
    assert_eq!(executor.attempts("broken"), 3);

    // A failed dependency never unblocks its dependent.
    assert_eq!(queue.task_status("after").await, Some(TaskStatus::Pending));
    assert_eq!(executor.attempts("after"), 0);

    let stats = queue.get_queue_stats().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.completed, 0);
    Ok(())
}

#[tokio::test]
async fn timeout_is_terminal_and_not_retried() -> TestResult {
    init_tracing();

    let queue = memory_queue(1);
    queue
        .add_task(Task::new("slow", "noop").with_timeout(Duration::from_millis(10)))
        .await?;

    let executor = FakeExecutor::new().with_delay("slow", Duration::from_secs(1));

    match queue.execute_task("slow", &executor).await {
        Err(TaskweaveError::Timeout { task, after }) => {
            assert_eq!(task, "slow");
            assert_eq!(after, Duration::from_millis(10));
        }
        other => panic!("expected Timeout, got {other:?}"),
    }

    let task = queue.task("slow").await.ok_or("task missing")?;
    assert_eq!(task.status, TaskStatus::Timeout);
    assert_eq!(task.retry_count, 0);
    assert!(task.error.as_deref().unwrap_or_default().contains("timed out"));
    assert!(queue.ready_ids().await.is_empty());
    assert_eq!(executor.attempts("slow"), 1);
    Ok(())
}

#[tokio::test]
async fn cancelling_running_task_frees_its_slot() -> TestResult {
    init_tracing();

    let queue = memory_queue(1);
    queue
        .add_task(Task::new("long", "noop").with_priority(TaskPriority::High))
        .await?;
    queue.add_task(Task::new("next", "noop")).await?;

    let executor = Arc::new(FakeExecutor::new().with_delay("long", Duration::from_secs(30)));
    let mut started = executor.start_notifications();

    let driver = {
        let queue = queue.clone();
        let executor = Arc::clone(&executor);
        tokio::spawn(async move { queue.process_queue(executor).await })
    };

    assert_eq!(with_timeout(started.recv()).await.as_deref(), Some("long"));
    assert_eq!(queue.running_ids().await, vec!["long"]);

    assert!(queue.cancel_task("long").await);
    assert_eq!(queue.task_status("long").await, Some(TaskStatus::Cancelled));
    assert!(queue.running_ids().await.is_empty());

    assert_eq!(with_timeout(started.recv()).await.as_deref(), Some("next"));
    with_timeout(driver).await?;

    assert_eq!(queue.task_status("long").await, Some(TaskStatus::Cancelled));
    assert_eq!(queue.task_status("next").await, Some(TaskStatus::Completed));
    assert!(!queue.cancel_task("long").await);
    Ok(())
}

#[tokio::test]
async fn cancelling_pending_task_blocks_its_dependents() -> TestResult {
    let queue = memory_queue(2);
    queue.add_task(Task::new("A", "noop")).await?;
    queue.add_task(Task::new("B", "noop").with_dependency("A")).await?;

    assert!(queue.cancel_task("A").await);
    assert!(queue.ready_ids().await.is_empty());
    assert!(!queue.cancel_task("A").await);
    assert!(!queue.cancel_task("unknown").await);

    let executor = Arc::new(FakeExecutor::new());
    with_timeout(queue.process_queue(Arc::clone(&executor))).await;

    assert!(executor.executed().is_empty());
    assert_eq!(queue.task_status("A").await, Some(TaskStatus::Cancelled));
    assert_eq!(queue.task_status("B").await, Some(TaskStatus::Pending));
    Ok(())
}

#[tokio::test]
async fn events_report_retries_completions_and_cancellations() -> TestResult {
    let queue = memory_queue(1);
    let mut events = queue.subscribe(16).await;

    queue
        .add_task(Task::new("flaky", "noop").with_max_retries(1))
        .await?;
    queue.add_task(Task::new("dropped", "noop")).await?;
    assert!(queue.cancel_task("dropped").await);

    let executor = Arc::new(FakeExecutor::new().script("flaky", [Step::Fail("nope".into())]));
    with_timeout(queue.process_queue(Arc::clone(&executor))).await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    assert_eq!(
        seen,
        vec![
            QueueEvent::TaskCancelled {
                task: "dropped".into()
            },
            QueueEvent::RetryScheduled {
                task: "flaky".into(),
                retry_count: 1,
                error: "nope".into(),
            },
            QueueEvent::TaskCompleted {
                task: "flaky".into()
            },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn executor_error_counts_as_failure() -> TestResult {
    let queue = memory_queue(1);
    queue
        .add_task(Task::new("raises", "noop").with_max_retries(0))
        .await?;

    let executor = FakeExecutor::new().script("raises", [Step::Error("connection refused".into())]);

    match queue.execute_task("raises", &executor).await {
        Err(TaskweaveError::ExecutionFailed { task, message }) => {
            assert_eq!(task, "raises");
            assert!(message.contains("connection refused"));
        }
        other => panic!("expected ExecutionFailed, got {other:?}"),
    }
    assert_eq!(queue.task_status("raises").await, Some(TaskStatus::Failed));
    Ok(())
}

#[tokio::test]
async fn panicking_executor_releases_its_slot() -> TestResult {
    init_tracing();

    let queue = memory_queue(1);
    queue
        .add_task(
            Task::new("boom", "noop")
                .with_priority(TaskPriority::High)
                .with_max_retries(0),
        )
        .await?;
    queue
        .add_task(Task::new("wobbly", "noop").with_max_retries(1))
        .await?;
    queue.add_task(Task::new("next", "noop")).await?;

    let executor = Arc::new(
        FakeExecutor::new()
            .script("boom", [Step::Panic])
            .script("wobbly", [Step::Panic]),
    );
    with_timeout(queue.process_queue(Arc::clone(&executor))).await;

    let boom = queue.task("boom").await.ok_or("task missing")?;
    assert_eq!(boom.status, TaskStatus::Failed);
    let err = boom.error.unwrap_or_default();
    assert!(err.contains("executor panicked"), "unexpected error: {err}");

    // A panic is an ordinary failed attempt, so the retry budget applies.
    let wobbly = queue.task("wobbly").await.ok_or("task missing")?;
    assert_eq!(wobbly.status, TaskStatus::Completed);
    assert_eq!(wobbly.retry_count, 1);

    assert_eq!(queue.task_status("next").await, Some(TaskStatus::Completed));
    assert!(queue.running_ids().await.is_empty());
    assert_eq!(executor.peak_concurrency(), 1);
    Ok(())
}
