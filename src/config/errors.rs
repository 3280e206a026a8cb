//! # Configuration Errors

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors, always fatal at startup.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Unreadable { path: String, source: String },

    #[error("invalid config JSON: {0}")]
    Malformed(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
