//! Worker
//!
//! Drives a single task through health gate, load, alias update, and
//! retention GC, retrying transient failures with backoff. Each step either
//! advances the task or returns a terminal outcome, resolved through an
//! async retry loop rather than a synchronous state machine, since retries
//! here are separated by real sleeps.

pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::health::HealthGate;
use crate::loader::Loader;
use crate::model::{DatabaseName, Task, TaskOutcome};
use crate::queue::TaskQueue;
use crate::retention;
use crate::stats::StatsCollector;

/// Tunables governing retry policy, independent of health/catalog wiring.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub health_check_retry_delay: Duration,
    pub max_retries: u32,
    pub retry_backoff_base: u64,
    pub retention_keep: usize,
}

/// One pool member. Stateless between tasks; all mutable state lives in the
/// shared queue, catalog, and stats collector.
pub struct Worker {
    id: usize,
    queue: Arc<TaskQueue>,
    health: Arc<HealthGate>,
    loader: Arc<dyn Loader>,
    catalog: Arc<dyn Catalog>,
    stats: Arc<StatsCollector>,
    config: WorkerConfig,
    shutdown: tokio::sync::watch::Receiver<bool>,
    clock: Arc<dyn Clock>,
}

/// Seam over wall-clock time, so tests can avoid ever sleeping.
///
/// Toolchain constraints prevent this crate from calling `Instant::now`
/// inside unit tests expecting deterministic timing; production code uses
/// `SystemClock`, tests substitute `SteppingClock`.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
    fn now_epoch_secs(&self) -> i64;
}

pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        queue: Arc<TaskQueue>,
        health: Arc<HealthGate>,
        loader: Arc<dyn Loader>,
        catalog: Arc<dyn Catalog>,
        stats: Arc<StatsCollector>,
        config: WorkerConfig,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Self {
        Self::with_clock(
            id,
            queue,
            health,
            loader,
            catalog,
            stats,
            config,
            shutdown,
            Arc::new(SystemClock),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_clock(
        id: usize,
        queue: Arc<TaskQueue>,
        health: Arc<HealthGate>,
        loader: Arc<dyn Loader>,
        catalog: Arc<dyn Catalog>,
        stats: Arc<StatsCollector>,
        config: WorkerConfig,
        shutdown: tokio::sync::watch::Receiver<bool>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            queue,
            health,
            loader,
            catalog,
            stats,
            config,
            shutdown,
            clock,
        }
    }

    /// Main loop: take a task, drive it to a terminal or retrying outcome,
    /// repeat until the queue closes and drains.
    pub async fn run(self) {
        while let Some(task) = self.queue.take().await {
            self.stats.record_task_started();
            match self.process(task).await {
                TaskOutcome::Completed => {
                    self.stats.record_completed(self.clock.now_epoch_secs());
                }
                TaskOutcome::Retrying { delay } => {
                    self.stats.record_retried(self.clock.now_epoch_secs());
                    let _ = delay;
                }
                TaskOutcome::Abandoned { reason } => {
                    warn!(worker = self.id, reason, "task abandoned");
                    self.stats.record_abandoned(self.clock.now_epoch_secs());
                }
            }
        }
    }

    /// Drive one task through exactly one attempt at health-check and load,
    /// returning the outcome. Re-enqueue (on retry) is performed here so the
    /// caller only needs to record stats.
    async fn process(&self, mut task: Task) -> TaskOutcome {
        match self.health.check().await {
            Ok((true, _reason)) => {}
            Ok((false, reason)) => {
                return self.schedule_health_retry(task, reason).await;
            }
            Err(e) => {
                return self.schedule_health_retry(task, e.to_string()).await;
            }
        }

        if let Err(load_err) = self
            .loader
            .load(&task.tenant, task.timestamp, &task.data_path)
            .await
        {
            if load_err.is_retryable() {
                return self.schedule_load_retry(task, load_err.to_string()).await;
            }
            info!(
                worker = self.id,
                tenant = %task.tenant,
                timestamp = %task.timestamp,
                error = %load_err,
                "permanent load failure, abandoning"
            );
            return TaskOutcome::Abandoned {
                reason: load_err.to_string(),
            };
        }

        if let Err(e) = self.converge_alias(&task).await {
            warn!(
                worker = self.id,
                tenant = %task.tenant,
                error = %e,
                "alias convergence failed; will retry on next snapshot"
            );
        }

        if let Err(e) = retention::collect_garbage(self.catalog.as_ref(), self.config.retention_keep).await {
            warn!(worker = self.id, error = %e, "retention GC failed");
        }

        info!(
            worker = self.id,
            tenant = %task.tenant,
            timestamp = %task.timestamp,
            retries = task.retry_count,
            "task completed"
        );
        task.last_error = None;
        TaskOutcome::Completed
    }

    /// Set the alias only if this timestamp is the current maximum present
    /// for the tenant.
    async fn converge_alias(&self, task: &Task) -> Result<(), crate::catalog::CatalogError> {
        let databases = self.catalog.list_databases().await?;
        let max_ts = databases
            .iter()
            .filter_map(|db| DatabaseName::parse_for_tenant(db.as_str(), &task.tenant))
            .max();

        if max_ts == Some(task.timestamp) {
            self.catalog
                .set_alias(&task.tenant, &task.database_name())
                .await?;
        }
        Ok(())
    }

    async fn schedule_health_retry(&self, mut task: Task, reason: String) -> TaskOutcome {
        if task.retry_count >= self.config.max_retries {
            return TaskOutcome::Abandoned {
                reason: format!("health gate: {reason}"),
            };
        }
        task.retry_count += 1;
        task.last_error = Some(reason);
        let delay = self.config.health_check_retry_delay;
        self.requeue_after(task, delay).await;
        TaskOutcome::Retrying { delay }
    }

    async fn schedule_load_retry(&self, mut task: Task, reason: String) -> TaskOutcome {
        if task.retry_count >= self.config.max_retries {
            return TaskOutcome::Abandoned { reason };
        }
        let delay = retry::backoff_delay(task.retry_count, self.config.retry_backoff_base);
        task.retry_count += 1;
        task.last_error = Some(reason);
        self.requeue_after(task, delay).await;
        TaskOutcome::Retrying { delay }
    }

    /// Sleep out the backoff then re-enqueue, unless shutdown arrives first.
    /// Retry backoff sleeps are interruptible by shutdown; in that case the
    /// task is simply dropped, to be rediscovered by the scanner on the
    /// next startup.
    async fn requeue_after(&self, task: Task, delay: Duration) {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            _ = self.clock.sleep(delay) => {
                self.queue.requeue(task);
            }
            _ = shutdown.changed() => {
                if !*shutdown.borrow() {
                    self.queue.requeue(task);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::health::{HealthConfig, HealthProbes, ProbeResult, UsageReading};
    use crate::loader::{LoadScript, MemoryLoader};
    use crate::model::{TenantId, Timestamp};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct AlwaysHealthy;

    #[async_trait::async_trait]
    impl HealthProbes for AlwaysHealthy {
        async fn ping(&self) -> crate::health::HealthResult<()> {
            Ok(())
        }
        async fn count_databases(&self) -> crate::health::HealthResult<usize> {
            Ok(0)
        }
        async fn heap_usage(&self) -> crate::health::HealthResult<ProbeResult<UsageReading>> {
            Ok(ProbeResult::Unavailable)
        }
        async fn pagecache_usage(&self) -> crate::health::HealthResult<ProbeResult<UsageReading>> {
            Ok(ProbeResult::Unavailable)
        }
    }

    struct InstantClock {
        epoch: AtomicI64,
    }

    #[async_trait::async_trait]
    impl Clock for InstantClock {
        async fn sleep(&self, _duration: Duration) {
            // No real sleep: tests must run in well under the default timeout.
        }
        fn now_epoch_secs(&self) -> i64 {
            self.epoch.fetch_add(1, Ordering::SeqCst)
        }
    }

    fn default_config() -> WorkerConfig {
        WorkerConfig {
            health_check_retry_delay: Duration::from_secs(1),
            max_retries: 3,
            retry_backoff_base: 2,
            retention_keep: 2,
        }
    }

    fn make_worker(
        catalog: Arc<MemoryCatalog>,
        loader: Arc<MemoryLoader>,
        config: WorkerConfig,
    ) -> (Worker, Arc<TaskQueue>, Arc<StatsCollector>, tokio::sync::watch::Sender<bool>) {
        let queue = Arc::new(TaskQueue::new());
        let stats = Arc::new(StatsCollector::new());
        let health = Arc::new(HealthGate::new(
            Arc::new(AlwaysHealthy),
            HealthConfig {
                max_databases: 100,
                heap_threshold_percent: 90.0,
                pagecache_threshold_percent: 90.0,
            },
        ));
        let (tx, rx) = tokio::sync::watch::channel(false);
        let worker = Worker::with_clock(
            0,
            Arc::clone(&queue),
            health,
            loader,
            catalog,
            Arc::clone(&stats),
            config,
            rx,
            Arc::new(InstantClock { epoch: AtomicI64::new(0) }),
        );
        (worker, queue, stats, tx)
    }

    #[tokio::test]
    async fn successful_load_sets_alias_for_latest_timestamp() {
        let catalog = Arc::new(MemoryCatalog::new());
        let loader = Arc::new(MemoryLoader::new(Arc::clone(&catalog)));
        let tenant = TenantId::new("t1");
        let task = Task::new(tenant.clone(), Timestamp(100), PathBuf::from("/data/t1/100"));

        let (worker, _queue, _stats, _tx) =
            make_worker(Arc::clone(&catalog), Arc::clone(&loader), default_config());
        let outcome = worker.process(task).await;

        assert!(matches!(outcome, TaskOutcome::Completed));
        assert_eq!(catalog.alias_target(&tenant), Some("t1-100".to_string()));
    }

    #[tokio::test]
    async fn older_timestamp_does_not_override_newer_alias() {
        let catalog = Arc::new(MemoryCatalog::new());
        let tenant = TenantId::new("t1");
        // Simulate t1-200 already present and aliased (a later snapshot that
        // finished first).
        catalog.create_database(DatabaseName::new(&tenant, Timestamp(200)));
        catalog
            .set_alias(&tenant, &DatabaseName::new(&tenant, Timestamp(200)))
            .await
            .unwrap();

        let loader = Arc::new(MemoryLoader::new(Arc::clone(&catalog)));
        let task = Task::new(tenant.clone(), Timestamp(100), PathBuf::from("/data/t1/100"));
        let (worker, _queue, _stats, _tx) =
            make_worker(Arc::clone(&catalog), loader, default_config());
        worker.process(task).await;

        assert_eq!(catalog.alias_target(&tenant), Some("t1-200".to_string()));
    }

    #[tokio::test]
    async fn transient_failure_retries_then_abandons_at_budget() {
        let catalog = Arc::new(MemoryCatalog::new());
        let loader = Arc::new(MemoryLoader::new(Arc::clone(&catalog)));
        let tenant = TenantId::new("t1");
        loader.script(
            tenant.clone(),
            Timestamp(100),
            vec![
                LoadScript::Transient("blip".into()),
                LoadScript::Transient("blip".into()),
                LoadScript::Transient("blip".into()),
                LoadScript::Transient("blip".into()),
            ],
        );

        let mut config = default_config();
        config.max_retries = 2;
        let (worker, _queue, _stats, _tx) =
            make_worker(Arc::clone(&catalog), Arc::clone(&loader), config);

        let mut task = Task::new(tenant.clone(), Timestamp(100), PathBuf::from("/data/t1/100"));
        for _ in 0..2 {
            match worker.process(task.clone()).await {
                TaskOutcome::Retrying { .. } => {
                    task.retry_count += 1;
                }
                other => panic!("expected retry, got {other:?}"),
            }
        }
        let final_outcome = worker.process(task).await;
        assert!(matches!(final_outcome, TaskOutcome::Abandoned { .. }));
    }

    #[tokio::test]
    async fn permanent_failure_abandons_immediately() {
        let catalog = Arc::new(MemoryCatalog::new());
        let loader = Arc::new(MemoryLoader::new(Arc::clone(&catalog)));
        let tenant = TenantId::new("t1");
        loader.script(
            tenant.clone(),
            Timestamp(100),
            vec![LoadScript::Permanent("bad schema".into())],
        );

        let (worker, _queue, _stats, _tx) =
            make_worker(Arc::clone(&catalog), loader, default_config());
        let task = Task::new(tenant, Timestamp(100), PathBuf::from("/data/t1/100"));
        let outcome = worker.process(task).await;
        assert!(matches!(outcome, TaskOutcome::Abandoned { .. }));
    }
}
