//! Health Gate
//!
//! Decides whether the database server can safely accept a new bulk load
//! right now. Checks run in order and short-circuit on first failure; the
//! gate is advisory, never authoritative.

mod errors;
mod probes;

pub use errors::{HealthError, HealthResult};
pub use probes::{HealthProbes, ProbeResult, UsageReading};

use std::sync::Arc;

/// Thresholds and caps the gate evaluates against.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub max_databases: usize,
    pub heap_threshold_percent: f64,
    pub pagecache_threshold_percent: f64,
}

/// Pre-flight health gate for the database server.
pub struct HealthGate {
    probes: Arc<dyn HealthProbes>,
    config: HealthConfig,
}

impl HealthGate {
    pub fn new(probes: Arc<dyn HealthProbes>, config: HealthConfig) -> Self {
        Self { probes, config }
    }

    /// Startup probe: a single connectivity check, fatal on failure.
    pub async fn probe_once(&self) -> HealthResult<()> {
        self.probes.ping().await
    }

    /// Evaluate whether a new bulk load can proceed right now.
    ///
    /// No side effects beyond the read-only probes themselves.
    pub async fn check(&self) -> HealthResult<(bool, String)> {
        // 1. Connectivity.
        if let Err(e) = self.probes.ping().await {
            return Ok((false, format!("unreachable: {e}")));
        }

        // 2. Database count, the one signal guaranteed on any edition.
        let count = self.probes.count_databases().await?;
        if count >= self.config.max_databases {
            return Ok((
                false,
                format!(
                    "too many databases ({count} >= {})",
                    self.config.max_databases
                ),
            ));
        }

        let mut reason_parts = Vec::new();

        // 3. Heap utilization, inconclusive if unavailable, never a veto.
        match self.probes.heap_usage().await? {
            ProbeResult::Available(reading) => {
                let pct = reading.percent_used();
                if pct >= self.config.heap_threshold_percent {
                    return Ok((
                        false,
                        format!(
                            "heap utilization too high ({pct:.1}% >= {:.1}%)",
                            self.config.heap_threshold_percent
                        ),
                    ));
                }
            }
            ProbeResult::Unavailable => reason_parts.push("heap probe unavailable"),
        }

        // 4. Page-cache utilization, same policy as heap.
        match self.probes.pagecache_usage().await? {
            ProbeResult::Available(reading) => {
                let pct = reading.percent_used();
                if pct >= self.config.pagecache_threshold_percent {
                    return Ok((
                        false,
                        format!(
                            "pagecache utilization too high ({pct:.1}% >= {:.1}%)",
                            self.config.pagecache_threshold_percent
                        ),
                    ));
                }
            }
            ProbeResult::Unavailable => reason_parts.push("pagecache probe unavailable"),
        }

        let reason = if reason_parts.is_empty() {
            "healthy".to_string()
        } else {
            reason_parts.join(", ")
        };
        Ok((true, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubProbes {
        reachable: bool,
        database_count: usize,
        heap: ProbeResult<UsageReading>,
        pagecache: ProbeResult<UsageReading>,
        ping_calls: AtomicUsize,
        unavailable_marker: Mutex<()>,
    }

    impl StubProbes {
        fn healthy() -> Self {
            Self {
                reachable: true,
                database_count: 1,
                heap: ProbeResult::Unavailable,
                pagecache: ProbeResult::Unavailable,
                ping_calls: AtomicUsize::new(0),
                unavailable_marker: Mutex::new(()),
            }
        }
    }

    #[async_trait]
    impl HealthProbes for StubProbes {
        async fn ping(&self) -> HealthResult<()> {
            self.ping_calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.unavailable_marker.lock().unwrap();
            if self.reachable {
                Ok(())
            } else {
                Err(HealthError::Unreachable("connection refused".into()))
            }
        }

        async fn count_databases(&self) -> HealthResult<usize> {
            Ok(self.database_count)
        }

        async fn heap_usage(&self) -> HealthResult<ProbeResult<UsageReading>> {
            Ok(self.heap)
        }

        async fn pagecache_usage(&self) -> HealthResult<ProbeResult<UsageReading>> {
            Ok(self.pagecache)
        }
    }

    fn default_config() -> HealthConfig {
        HealthConfig {
            max_databases: 10,
            heap_threshold_percent: 90.0,
            pagecache_threshold_percent: 90.0,
        }
    }

    #[tokio::test]
    async fn healthy_when_everything_available_and_under_threshold() {
        let gate = HealthGate::new(Arc::new(StubProbes::healthy()), default_config());
        let (healthy, _reason) = gate.check().await.unwrap();
        assert!(healthy);
    }

    #[tokio::test]
    async fn unreachable_fails_fast() {
        let mut probes = StubProbes::healthy();
        probes.reachable = false;
        let gate = HealthGate::new(Arc::new(probes), default_config());
        let (healthy, reason) = gate.check().await.unwrap();
        assert!(!healthy);
        assert!(reason.starts_with("unreachable"));
    }

    #[tokio::test]
    async fn too_many_databases_vetoes() {
        let mut probes = StubProbes::healthy();
        probes.database_count = 5;
        let mut config = default_config();
        config.max_databases = 5;
        let gate = HealthGate::new(Arc::new(probes), config);
        let (healthy, reason) = gate.check().await.unwrap();
        assert!(!healthy);
        assert!(reason.contains("too many databases"));
    }

    #[tokio::test]
    async fn heap_probe_unavailable_does_not_veto() {
        let mut probes = StubProbes::healthy();
        probes.heap = ProbeResult::Unavailable;
        probes.pagecache = ProbeResult::Unavailable;
        let gate = HealthGate::new(Arc::new(probes), default_config());
        let (healthy, reason) = gate.check().await.unwrap();
        assert!(healthy);
        assert!(reason.contains("heap probe unavailable"));
        assert!(reason.contains("pagecache probe unavailable"));
    }

    #[tokio::test]
    async fn heap_over_threshold_vetoes() {
        let mut probes = StubProbes::healthy();
        probes.heap = ProbeResult::Available(UsageReading {
            used: 95,
            available: 5,
        });
        let gate = HealthGate::new(Arc::new(probes), default_config());
        let (healthy, reason) = gate.check().await.unwrap();
        assert!(!healthy);
        assert!(reason.contains("heap utilization"));
    }

    #[tokio::test]
    async fn pagecache_over_threshold_vetoes_when_heap_ok() {
        let mut probes = StubProbes::healthy();
        probes.heap = ProbeResult::Available(UsageReading {
            used: 10,
            available: 90,
        });
        probes.pagecache = ProbeResult::Available(UsageReading {
            used: 99,
            available: 1,
        });
        let gate = HealthGate::new(Arc::new(probes), default_config());
        let (healthy, reason) = gate.check().await.unwrap();
        assert!(!healthy);
        assert!(reason.contains("pagecache utilization"));
    }
}
