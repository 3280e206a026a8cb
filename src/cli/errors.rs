//! CLI-specific error types
//!
//! All CLI errors are fatal: `main` prints them as JSON and exits nonzero,
//! 0 only on a clean run, nonzero on configuration-validation failure or a
//! fatal startup probe failure.

use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("{0}")]
    Supervisor(#[from] crate::supervisor::SupervisorError),

    #[error("catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// A short, stable machine-readable code for the printed error JSON.
    pub fn code_str(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CONFIG_ERROR",
            CliError::Supervisor(_) => "SUPERVISOR_ERROR",
            CliError::Catalog(_) => "CATALOG_ERROR",
            CliError::Io(_) => "IO_ERROR",
            CliError::Json(_) => "JSON_ERROR",
        }
    }
}
