//! Status Publisher
//!
//! Periodically (and at lifecycle transitions) rewrites a JSON status file
//! atomically via temp-file-then-rename, the same durability pattern
//! `promotion::marker::DurableMarker::write_atomic` uses for its authority
//! marker.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde::Serialize;
use tracing::warn;

use crate::queue::TaskQueue;
use crate::stats::StatsCollector;
use crate::supervisor::state::SupervisorState;

#[derive(Serialize)]
struct StatusDocument {
    status: SupervisorState,
    uptime_seconds: i64,
    workers: usize,
    scan_interval: u64,
    data_path: String,
    queue_size: usize,
    tasks_discovered: u64,
    tasks_completed: u64,
    tasks_failed: u64,
    tasks_retried: u64,
    success_rate: f64,
    last_activity: String,
}

/// Fixed, immutable fields reported alongside the live counters.
pub struct StatusFields {
    pub workers: usize,
    pub scan_interval_secs: u64,
    pub data_path: String,
}

/// Rewrites the configured status file. Write failures are logged and
/// otherwise ignored.
pub struct StatusPublisher {
    path: PathBuf,
    tmp_path: PathBuf,
    fields: StatusFields,
    queue: std::sync::Arc<TaskQueue>,
    stats: std::sync::Arc<StatsCollector>,
    started_at_epoch_secs: i64,
    status: std::sync::Arc<AtomicStatus>,
}

#[derive(Default)]
struct AtomicStatus(std::sync::atomic::AtomicU8);

impl AtomicStatus {
    fn store(&self, status: SupervisorState) {
        self.0.store(status as u8, Ordering::Relaxed);
    }

    fn load(&self) -> SupervisorState {
        match self.0.load(Ordering::Relaxed) {
            0 => SupervisorState::Init,
            1 => SupervisorState::Running,
            2 => SupervisorState::Stopping,
            _ => SupervisorState::Stopped,
        }
    }
}

impl StatusPublisher {
    pub fn new(
        path: impl Into<PathBuf>,
        fields: StatusFields,
        queue: std::sync::Arc<TaskQueue>,
        stats: std::sync::Arc<StatsCollector>,
        now_epoch_secs: i64,
    ) -> Self {
        let path = path.into();
        let tmp_path = tmp_sibling(&path);
        Self {
            path,
            tmp_path,
            fields,
            queue,
            stats,
            started_at_epoch_secs: now_epoch_secs,
            status: std::sync::Arc::new(AtomicStatus::default()),
        }
    }

    /// Transition the reported lifecycle status. Safe to call from any task.
    pub fn set_status(&self, status: SupervisorState) {
        self.status.store(status);
    }

    /// Rewrite the status file once, atomically.
    pub async fn publish_once(&self, now_epoch_secs: i64) {
        let snapshot = self.stats.snapshot();
        let doc = StatusDocument {
            status: self.status.load(),
            uptime_seconds: (now_epoch_secs - self.started_at_epoch_secs).max(0),
            workers: self.fields.workers,
            scan_interval: self.fields.scan_interval_secs,
            data_path: self.fields.data_path.clone(),
            queue_size: self.queue.size(),
            tasks_discovered: snapshot.discovered,
            tasks_completed: snapshot.completed,
            tasks_failed: snapshot.failed,
            tasks_retried: snapshot.retried,
            success_rate: snapshot.success_rate * 100.0,
            last_activity: rfc3339(self.stats.last_activity_epoch_secs()),
        };

        if let Err(e) = self.write(&doc).await {
            warn!(error = %e, "status file write failed");
        }
    }

    async fn write(&self, doc: &StatusDocument) -> std::io::Result<()> {
        let body = serde_json::to_vec_pretty(doc)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.tmp_path, &body).await?;
        tokio::fs::rename(&self.tmp_path, &self.path).await?;
        Ok(())
    }

    /// Run the periodic 5s publish loop until `shutdown` fires.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>, now: fn() -> i64) {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.publish_once(now()).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.publish_once(now()).await;
                        return;
                    }
                }
            }
        }
    }
}

/// RFC-3339 rendering of an epoch-seconds timestamp, `0` (never-active)
/// rendering as the Unix epoch rather than a sentinel string.
fn rfc3339(epoch_secs: i64) -> String {
    Utc.timestamp_opt(epoch_secs, 0)
        .single()
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TenantId, Timestamp};
    use std::path::PathBuf;

    #[tokio::test]
    async fn publish_writes_valid_json_with_expected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let queue = std::sync::Arc::new(TaskQueue::new());
        queue.offer(crate::model::Task::new(
            TenantId::new("t1"),
            Timestamp(100),
            PathBuf::from("/data/t1/100"),
        ));
        let stats = std::sync::Arc::new(StatsCollector::new());
        stats.record_discovered(1);

        let publisher = StatusPublisher::new(
            &path,
            StatusFields {
                workers: 2,
                scan_interval_secs: 10,
                data_path: "/data".to_string(),
            },
            queue,
            stats,
            1_000,
        );
        publisher.set_status(SupervisorState::Running);
        publisher.publish_once(1_030).await;

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["status"], "running");
        assert_eq!(parsed["uptime_seconds"], 30);
        assert_eq!(parsed["queue_size"], 1);
        assert_eq!(parsed["tasks_discovered"], 1);
        assert!(parsed["last_activity"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn publish_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let queue = std::sync::Arc::new(TaskQueue::new());
        let stats = std::sync::Arc::new(StatsCollector::new());

        let publisher = StatusPublisher::new(
            &path,
            StatusFields {
                workers: 1,
                scan_interval_secs: 5,
                data_path: "/data".to_string(),
            },
            queue,
            stats,
            0,
        );
        publisher.publish_once(0).await;

        assert!(path.exists());
        assert!(!tmp_sibling(&path).exists());
    }
}
