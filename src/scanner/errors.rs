//! # Scanner Errors

use thiserror::Error;

pub type ScannerResult<T> = Result<T, ScannerError>;

/// Scanner errors. A merely-incomplete snapshot is not an error; it is
/// silently skipped. These variants are reserved for the root itself
/// being unusable.
#[derive(Debug, Clone, Error)]
pub enum ScannerError {
    #[error("snapshot root does not exist: {0}")]
    RootMissing(String),

    #[error("snapshot root is not readable: {0}")]
    RootUnreadable(String),
}
