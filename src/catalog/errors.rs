//! # Catalog Errors

use thiserror::Error;

/// Result type for catalog/alias operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog / alias errors.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("catalog unreachable: {0}")]
    Unreachable(String),

    #[error("alias operation failed: {0}")]
    AliasFailed(String),

    #[error("database operation failed: {0}")]
    DatabaseOpFailed(String),
}
