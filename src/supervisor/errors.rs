//! # Supervisor Errors

use thiserror::Error;

pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Fatal startup errors; anything surfaced here aborts the process before
/// any worker is spawned.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("database server unreachable at startup: {0}")]
    ServerUnreachable(#[from] crate::health::HealthError),

    #[error("snapshot root invalid: {0}")]
    SnapshotRoot(#[from] crate::scanner::ScannerError),
}
