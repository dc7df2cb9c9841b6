// tests/integration/error_handling.rs

use std::io::Write;
use tempfile::NamedTempFile;
use taskweave::config::load_and_validate;
use taskweave::errors::TaskweaveError;
use taskweave_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["B"]

[task.B]
cmd = "echo B"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskweaveError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskweaveError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_self_dependency_returns_config_error() {
    let raw = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::new("echo A").after("A").build())
        .raw();

    match taskweave::config::ConfigFile::try_from(raw) {
        Err(TaskweaveError::ConfigError(msg)) => assert!(msg.contains("itself")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_zero_limits_are_rejected() {
    let raw = ConfigFileBuilder::new().max_concurrent(0).raw();
    assert!(matches!(
        taskweave::config::ConfigFile::try_from(raw),
        Err(TaskweaveError::ConfigError(_))
    ));

    let raw = ConfigFileBuilder::new().max_parallel(0).raw();
    assert!(matches!(
        taskweave::config::ConfigFile::try_from(raw),
        Err(TaskweaveError::ConfigError(_))
    ));
}

#[test]
fn test_invalid_priority_is_a_toml_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
priority = "urgent"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskweaveError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/Taskweave.toml"),
        Err(TaskweaveError::IoError(_))
    ));
}
