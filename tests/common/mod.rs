//! Shared test helpers for the supervisor's end-to-end scenario tests.

use std::path::Path;
use std::time::Duration;

use tenantswitch::health::{HealthProbes, HealthResult, ProbeResult, UsageReading};

/// Write a structurally complete snapshot fixture at
/// `{root}/{tenant}/{timestamp}/{nodes,relationships}`.
pub fn make_snapshot(root: &Path, tenant: &str, timestamp: i64) {
    let dir = root.join(tenant).join(timestamp.to_string());
    std::fs::create_dir_all(dir.join("nodes")).unwrap();
    std::fs::create_dir_all(dir.join("relationships")).unwrap();
    std::fs::write(dir.join("nodes/person.csv"), b"id\n1\n").unwrap();
    std::fs::write(dir.join("relationships/knows.csv"), b"src,dst\n1,1\n").unwrap();
}

/// An always-reachable `HealthProbes` stub whose database count is
/// adjustable at runtime, for scenarios that simulate an operator
/// clearing server-side resource pressure mid-run.
pub struct StubProbes {
    pub database_count: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl StubProbes {
    pub fn new(initial_count: usize) -> Self {
        Self {
            database_count: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(initial_count)),
        }
    }
}

#[async_trait::async_trait]
impl HealthProbes for StubProbes {
    async fn ping(&self) -> HealthResult<()> {
        Ok(())
    }

    async fn count_databases(&self) -> HealthResult<usize> {
        Ok(self.database_count.load(std::sync::atomic::Ordering::SeqCst))
    }

    async fn heap_usage(&self) -> HealthResult<ProbeResult<UsageReading>> {
        Ok(ProbeResult::Unavailable)
    }

    async fn pagecache_usage(&self) -> HealthResult<ProbeResult<UsageReading>> {
        Ok(ProbeResult::Unavailable)
    }
}

/// Poll `condition` until it's true or `timeout` elapses, panicking on
/// timeout. Avoids hand-rolled sleep loops scattered through every test.
pub async fn wait_until(mut condition: impl FnMut() -> bool, timeout: Duration) {
    let start = tokio::time::Instant::now();
    while !condition() {
        if start.elapsed() > timeout {
            panic!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
