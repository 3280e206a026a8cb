//! # Health Probes
//!
//! The external collaborator seam for server liveness and resource-pressure
//! signals. Implementations may be a real graph-database driver or, as
//! here, an in-memory test double.

use async_trait::async_trait;

use super::errors::HealthResult;

/// A point-in-time resource reading, or an explicit signal that the server
/// edition does not expose this probe.
///
/// A closed, two-variant shape evaluated at the call site, not an `Option`
/// conflated with "zero usage".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeResult<T> {
    Available(T),
    Unavailable,
}

/// `used` and `available` bytes, as exposed by a heap/pagecache probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageReading {
    pub used: u64,
    pub available: u64,
}

impl UsageReading {
    /// `used / (used + available)` as a percentage in `0.0..=100.0`.
    ///
    /// Returns `0.0` for a degenerate all-zero reading rather than dividing
    /// by zero.
    pub fn percent_used(&self) -> f64 {
        let total = self.used + self.available;
        if total == 0 {
            0.0
        } else {
            (self.used as f64 / total as f64) * 100.0
        }
    }
}

/// Read-only probes against the database server's system catalog and
/// resource-management subsystems.
#[async_trait]
pub trait HealthProbes: Send + Sync {
    /// A trivial round-trip against the system catalog. Failure means the
    /// server is unreachable.
    async fn ping(&self) -> HealthResult<()>;

    /// Total number of user databases currently on the server.
    async fn count_databases(&self) -> HealthResult<usize>;

    /// Heap utilization, or `Unavailable` if this server edition does not
    /// expose the probe (never an error in that case).
    async fn heap_usage(&self) -> HealthResult<ProbeResult<UsageReading>>;

    /// Page-cache utilization, or `Unavailable` if unexposed.
    async fn pagecache_usage(&self) -> HealthResult<ProbeResult<UsageReading>>;
}

/// A minimal, always-reachable `HealthProbes` implementation for the CLI's
/// `start` command.
///
/// The real driver for a given graph-database edition is out of scope; this
/// stand-in reports the database count from whatever `Catalog` the binary
/// was wired with and never exposes heap/pagecache readings, so the health
/// gate's memory-pressure checks are simply inconclusive rather than wrong.
pub struct StaticProbes {
    catalog: std::sync::Arc<dyn crate::catalog::Catalog>,
}

impl StaticProbes {
    pub fn new(catalog: std::sync::Arc<dyn crate::catalog::Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl HealthProbes for StaticProbes {
    async fn ping(&self) -> HealthResult<()> {
        Ok(())
    }

    async fn count_databases(&self) -> HealthResult<usize> {
        let count = self
            .catalog
            .list_databases()
            .await
            .map_err(|e| super::errors::HealthError::CountProbeFailed(e.to_string()))?
            .len();
        Ok(count)
    }

    async fn heap_usage(&self) -> HealthResult<ProbeResult<UsageReading>> {
        Ok(ProbeResult::Unavailable)
    }

    async fn pagecache_usage(&self) -> HealthResult<ProbeResult<UsageReading>> {
        Ok(ProbeResult::Unavailable)
    }
}
