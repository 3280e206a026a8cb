//! Supervisor configuration
//!
//! A `serde`-deserialized struct with field-level defaults, loaded from a
//! JSON file and validated once at startup.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::path::Path;

use serde::{Deserialize, Serialize};

fn default_workers() -> usize {
    1
}
fn default_scan_interval() -> u64 {
    30
}
fn default_max_databases() -> usize {
    100
}
fn default_heap_threshold() -> f64 {
    90.0
}
fn default_pagecache_threshold() -> f64 {
    90.0
}
fn default_health_check_retry_delay() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    5
}
fn default_retry_backoff_base() -> u64 {
    2
}
fn default_shutdown_timeout() -> u64 {
    30
}
fn default_retention_keep() -> usize {
    2
}

/// Recognized options, deserialized from the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Filesystem root to scan for tenant snapshot directories.
    pub snapshot_root: String,

    /// Size of the worker pool. `1` is the safe default (sequential).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Period of scanner sweeps, in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    /// Health-gate cap on total user databases.
    #[serde(default = "default_max_databases")]
    pub max_databases: usize,

    /// Health-gate heap utilization cap, percent.
    #[serde(default = "default_heap_threshold")]
    pub heap_threshold_percent: f64,

    /// Health-gate page-cache utilization cap, percent.
    #[serde(default = "default_pagecache_threshold")]
    pub pagecache_threshold_percent: f64,

    /// Re-enqueue delay after a failed health check, in seconds.
    #[serde(default = "default_health_check_retry_delay")]
    pub health_check_retry_delay: u64,

    /// Per-task retry budget.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Exponential base for retry sleep.
    #[serde(default = "default_retry_backoff_base")]
    pub retry_backoff_base: u64,

    /// Grace period on shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    /// Databases kept per tenant by retention GC.
    #[serde(default = "default_retention_keep")]
    pub retention_keep: usize,

    /// Path the status file is rewritten to.
    #[serde(default = "default_status_path")]
    pub status_path: String,

    /// Database server connection parameters, opaque beyond being passed to
    /// the catalog/loader collaborators.
    #[serde(default)]
    pub server: ServerConnection,
}

fn default_status_path() -> String {
    "status.json".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConnection {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Config {
    /// Load and validate configuration from a JSON file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Plausibility checks: required keys present, numeric values in
    /// plausible ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.snapshot_root.trim().is_empty() {
            return Err(ConfigError::Invalid("snapshotRoot must not be empty".into()));
        }
        if self.workers < 1 {
            return Err(ConfigError::Invalid("workers must be >= 1".into()));
        }
        if self.scan_interval == 0 {
            return Err(ConfigError::Invalid("scanInterval must be > 0".into()));
        }
        if self.shutdown_timeout == 0 {
            return Err(ConfigError::Invalid("shutdownTimeout must be > 0".into()));
        }
        if self.retry_backoff_base < 1 {
            return Err(ConfigError::Invalid("retryBackoffBase must be >= 1".into()));
        }
        if self.retention_keep < 1 {
            return Err(ConfigError::Invalid("retentionKeep must be >= 1".into()));
        }
        for (name, pct) in [
            ("heapThresholdPercent", self.heap_threshold_percent),
            ("pagecacheThresholdPercent", self.pagecache_threshold_percent),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be in 0..100, got {pct}"
                )));
            }
        }
        Ok(())
    }

    pub fn snapshot_root_path(&self) -> &Path {
        Path::new(&self.snapshot_root)
    }
}
