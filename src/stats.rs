//! Stats Collector
//!
//! In-process counters surfaced through the status file. Plain `AtomicU64`
//! counters behind a `Default`-constructed struct, no external metrics
//! backend.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Snapshot of collector state at a point in time, as published in the status file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsSnapshot {
    pub discovered: u64,
    pub completed: u64,
    pub failed: u64,
    pub retried: u64,
    pub in_flight: u64,
    pub success_rate: f64,
}

#[derive(Default)]
pub struct StatsCollector {
    discovered: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
    in_flight: AtomicU64,
    last_activity_epoch_secs: AtomicI64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_discovered(&self, count: u64) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_task_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self, now_epoch_secs: i64) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.last_activity_epoch_secs.store(now_epoch_secs, Ordering::Relaxed);
    }

    pub fn record_retried(&self, now_epoch_secs: i64) {
        self.retried.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.last_activity_epoch_secs.store(now_epoch_secs, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self, now_epoch_secs: i64) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.last_activity_epoch_secs.store(now_epoch_secs, Ordering::Relaxed);
    }

    pub fn last_activity_epoch_secs(&self) -> i64 {
        self.last_activity_epoch_secs.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let attempted = completed + failed;
        let success_rate = if attempted == 0 {
            1.0
        } else {
            completed as f64 / attempted as f64
        };
        StatsSnapshot {
            discovered: self.discovered.load(Ordering::Relaxed),
            completed,
            failed,
            retried: self.retried.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_one_with_no_attempts() {
        let stats = StatsCollector::new();
        assert_eq!(stats.snapshot().success_rate, 1.0);
    }

    #[test]
    fn success_rate_reflects_completed_vs_failed() {
        let stats = StatsCollector::new();
        stats.record_task_started();
        stats.record_completed(1000);
        stats.record_task_started();
        stats.record_abandoned(1001);

        let snap = stats.snapshot();
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.success_rate, 0.5);
        assert_eq!(snap.in_flight, 0);
    }

    #[test]
    fn retried_does_not_count_as_attempted() {
        let stats = StatsCollector::new();
        stats.record_task_started();
        stats.record_retried(1000);
        assert_eq!(stats.snapshot().success_rate, 1.0);
        assert_eq!(stats.snapshot().retried, 1);
    }
}
