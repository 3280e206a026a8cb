//! Supervisor
//!
//! Owns process lifecycle: validates configuration, probes the server,
//! constructs every other component, spawns the scanner loop, the worker
//! pool, and the status publisher, then mediates graceful shutdown.

pub mod state;

mod errors;

pub use errors::{SupervisorError, SupervisorResult};
pub use state::SupervisorState;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::health::{HealthConfig, HealthGate, HealthProbes};
use crate::loader::Loader;
use crate::model::Task;
use crate::queue::TaskQueue;
use crate::scanner::SnapshotScanner;
use crate::stats::StatsCollector;
use crate::status::{StatusFields, StatusPublisher};
use crate::worker::{Worker, WorkerConfig};

/// Everything the supervisor needs beyond its own configuration. Collected
/// into one struct so `Supervisor::new` doesn't take an unmanageable
/// argument list, and so tests can substitute in-memory collaborators.
pub struct Collaborators {
    pub probes: Arc<dyn HealthProbes>,
    pub catalog: Arc<dyn Catalog>,
    pub loader: Arc<dyn Loader>,
}

pub struct Supervisor {
    config: Config,
    collaborators: Collaborators,
    queue: Arc<TaskQueue>,
    stats: Arc<StatsCollector>,
    health: Arc<HealthGate>,
    status: Arc<StatusPublisher>,
    state: std::sync::Mutex<SupervisorState>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl Supervisor {
    /// Startup sequence steps 1-4: validate config, probe the server, verify
    /// the snapshot root, and construct every component.
    pub async fn bootstrap(
        config: Config,
        collaborators: Collaborators,
        started_at_epoch_secs: i64,
    ) -> SupervisorResult<Self> {
        config.validate()?;

        let health = Arc::new(HealthGate::new(
            Arc::clone(&collaborators.probes),
            HealthConfig {
                max_databases: config.max_databases,
                heap_threshold_percent: config.heap_threshold_percent,
                pagecache_threshold_percent: config.pagecache_threshold_percent,
            },
        ));
        health.probe_once().await?;

        let scanner = SnapshotScanner::new(config.snapshot_root_path());
        scanner.verify_root()?;

        let queue = Arc::new(TaskQueue::new());
        let stats = Arc::new(StatsCollector::new());
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let status = Arc::new(StatusPublisher::new(
            &config.status_path,
            StatusFields {
                workers: config.workers,
                scan_interval_secs: config.scan_interval,
                data_path: config.snapshot_root.clone(),
            },
            Arc::clone(&queue),
            Arc::clone(&stats),
            started_at_epoch_secs,
        ));

        Ok(Self {
            config,
            collaborators,
            queue,
            stats,
            health,
            status,
            state: std::sync::Mutex::new(SupervisorState::Init),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// A handle callers (e.g. a signal handler in `main`) use to request
    /// shutdown. Sending twice is harmless; the second send is what the CLI
    /// layer treats as "exit immediately" at the process level.
    pub fn shutdown_handle(&self) -> tokio::sync::watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    pub fn stats(&self) -> Arc<StatsCollector> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.lock().unwrap()
    }

    /// Apply a validated state transition and mirror it into the status
    /// file's reported `status` field in one step.
    fn transition(&self, next: impl FnOnce(SupervisorState) -> Result<SupervisorState, state::StateError>) {
        let mut current = self.state.lock().unwrap();
        match next(*current) {
            Ok(new_state) => {
                *current = new_state;
                self.status.set_status(new_state);
            }
            Err(e) => warn!(error = %e, "ignored invalid supervisor state transition"),
        }
    }

    /// Startup step 5-6 and the full run-to-shutdown lifecycle.
    pub async fn run(self) -> SupervisorResult<()> {
        self.transition(SupervisorState::start);
        info!(workers = self.config.workers, "supervisor running");

        let scanner_handle = tokio::spawn(Self::scanner_loop(
            SnapshotScanner::new(self.config.snapshot_root_path()),
            Arc::clone(&self.queue),
            Arc::clone(&self.stats),
            Duration::from_secs(self.config.scan_interval),
            self.shutdown_rx.clone(),
        ));

        let worker_config = WorkerConfig {
            health_check_retry_delay: Duration::from_secs(self.config.health_check_retry_delay),
            max_retries: self.config.max_retries,
            retry_backoff_base: self.config.retry_backoff_base,
            retention_keep: self.config.retention_keep,
        };

        let mut worker_handles = Vec::new();
        for id in 0..self.config.workers {
            let worker = Worker::new(
                id,
                Arc::clone(&self.queue),
                Arc::clone(&self.health),
                Arc::clone(&self.collaborators.loader),
                Arc::clone(&self.collaborators.catalog),
                Arc::clone(&self.stats),
                worker_config.clone(),
                self.shutdown_rx.clone(),
            );
            worker_handles.push(tokio::spawn(worker.run()));
        }

        let status_handle = {
            let status = Arc::clone(&self.status);
            let shutdown_rx = self.shutdown_rx.clone();
            tokio::spawn(async move {
                status.run(shutdown_rx, now_epoch_secs).await;
            })
        };

        // Block until the first shutdown signal.
        let mut shutdown_rx = self.shutdown_rx.clone();
        let _ = shutdown_rx.changed().await;

        info!("supervisor stopping");
        self.transition(SupervisorState::begin_stopping);
        self.status.publish_once(now_epoch_secs()).await;

        // Step 2: close the queue so scanner offers stop landing and idle
        // workers wake up and exit.
        self.queue.close();
        let _ = scanner_handle.await;

        // Step 3: allow in-flight workers up to shutdownTimeout to finish.
        let drain = futures_join_all(worker_handles);
        let timeout = Duration::from_secs(self.config.shutdown_timeout);
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!("shutdown timeout elapsed; remaining in-flight tasks abandoned");
        }

        let _ = status_handle.await;
        self.transition(SupervisorState::finish_stopping);
        self.status.publish_once(now_epoch_secs()).await;
        info!("supervisor stopped");
        Ok(())
    }

    async fn scanner_loop(
        scanner: SnapshotScanner,
        queue: Arc<TaskQueue>,
        stats: Arc<StatsCollector>,
        scan_interval: Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        loop {
            match scanner.scan() {
                Ok(found) => {
                    let mut admitted = 0u64;
                    for snap in found {
                        let task = Task::new(snap.tenant, snap.timestamp, snap.path);
                        if queue.offer(task) {
                            admitted += 1;
                        }
                    }
                    if admitted > 0 {
                        stats.record_discovered(admitted);
                    }
                }
                Err(e) => warn!(error = %e, "snapshot scan failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(scan_interval) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }
}

/// Thin wrapper so the shutdown sequence reads as one step rather than an
/// inline `futures::future::join_all` import pulled in for a single call site.
async fn futures_join_all(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

fn now_epoch_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
