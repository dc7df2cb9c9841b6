// tests/integration/config_workflow.rs

use std::sync::Arc;
use std::time::Duration;

use taskweave::types::{TaskPriority, TaskStatus, Strategy};
use taskweave::queue::TaskQueue;
use taskweave::workflow::WorkflowOrchestrator;
use taskweave::workflow_steps;
use taskweave_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use taskweave_test_utils::fake_executor::FakeExecutor;
use taskweave_test_utils::{init_tracing, with_timeout};

#[test]
fn config_tasks_become_indexed_workflow_steps() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", TaskConfigBuilder::new("make").build())
        .with_task(
            "deploy",
            TaskConfigBuilder::new("make deploy")
                .after("build")
                .after("test")
                .description("ship the build to the staging hosts")
                .build(),
        )
        .with_task("test", TaskConfigBuilder::new("make test").after("build").build())
        .build();

    let steps = workflow_steps(&cfg);
    assert_eq!(steps.len(), 3);

    // Ids sort as build, deploy, test.
    assert_eq!(steps[0].description, "make");
    assert_eq!(steps[1].description, "ship the build to the staging hosts");
    assert_eq!(steps[1].dependencies, vec![0, 2]);
    assert_eq!(steps[2].dependencies, vec![0]);
    assert_eq!(steps[2].parameters["cmd"], "make test");
}

#[tokio::test]
async fn config_drives_queue_end_to_end() {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .max_concurrent(2)
        .with_task("a", TaskConfigBuilder::new("echo a").build())
        .with_task(
            "b",
            TaskConfigBuilder::new("echo b")
                .priority(TaskPriority::Critical)
                .after("a")
                .timeout(Duration::from_secs(5))
                .build(),
        )
        .build();

    let queue = TaskQueue::new(cfg.queue_options());
    for task in cfg.queue_tasks() {
        queue.add_task(task).await.unwrap();
    }

    let executor = Arc::new(FakeExecutor::new());
    with_timeout(queue.process_queue(Arc::clone(&executor))).await;

    assert_eq!(executor.executed(), vec!["a", "b"]);
    assert_eq!(queue.task_status("b").await, Some(TaskStatus::Completed));
}

#[tokio::test]
async fn config_drives_workflow_end_to_end() {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task("one", TaskConfigBuilder::new("echo one").build())
        .with_task("two", TaskConfigBuilder::new("echo two").after("one").build())
        .build();

    let executor = FakeExecutor::new();
    let orch = WorkflowOrchestrator::new(cfg.workflow_settings(), Arc::new(executor.clone()));
    let report = with_timeout(orch.execute_workflow("cfg", workflow_steps(&cfg), Strategy::Parallel)).await;

    assert!(report.success);
    assert_eq!(executor.executed(), vec!["cfg:0", "cfg:1"]);
}
