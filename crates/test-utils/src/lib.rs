// crates/test-utils/src/lib.rs

//! Shared helpers for assetflow's integration tests: graph builders with
//! recording task bodies, a fake executor, tracing setup and timeouts.

pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

pub use builders::{ExecutionLog, GraphBuilder, RecordingBody};
pub use fake_executor::FakeExecutor;

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a test-friendly subscriber once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests. The filter comes from `ASSETFLOW_LOG` (same variable as the
/// binary), falling back to `warn,assetflow=info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(assetflow::logging::LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("warn,assetflow=info"));

        // Another harness may have installed one already.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, failing the test after [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    within(TEST_TIMEOUT, f).await
}

/// Await `f`, failing the test after `limit`.
pub async fn within<F, T>(limit: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, f).await {
        Ok(value) => value,
        Err(_) => panic!("test step timed out after {limit:?}"),
    }
}
