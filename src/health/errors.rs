//! # Health Gate Errors

use thiserror::Error;

/// Result type for health-gate operations.
pub type HealthResult<T> = Result<T, HealthError>;

/// Health-gate errors.
///
/// These represent *probe* failures (the round-trip to the server itself
/// could not be completed), not an unhealthy verdict; an unhealthy verdict
/// is a normal `Ok((false, reason))` return from `HealthGate::check`.
#[derive(Debug, Clone, Error)]
pub enum HealthError {
    #[error("database server unreachable: {0}")]
    Unreachable(String),

    #[error("database count probe failed: {0}")]
    CountProbeFailed(String),
}
