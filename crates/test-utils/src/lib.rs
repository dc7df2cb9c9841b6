//! Shared helpers for taskweave's integration tests.

pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use taskweave::logging::LOG_ENV_VAR;
use tracing_subscriber::EnvFilter;

/// Ceiling on any single awaited queue or workflow operation in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Route taskweave logs into the test harness capture.
///
/// Honours the same `TASKWEAVE_LOG` filter as the binary and otherwise logs
/// this crate at `debug`, so a failing scheduler test shows every attempt.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|spec| EnvFilter::try_new(spec).ok())
            .unwrap_or_else(|| EnvFilter::new("warn,taskweave=debug"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, failing the test if the queue or workflow stalls.
pub async fn with_timeout<F: Future>(f: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(output) => output,
        Err(_) => panic!("did not finish within {TEST_TIMEOUT:?}; queue or workflow stalled"),
    }
}
