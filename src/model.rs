//! Core data model: tenants, timestamps, database names and tasks.
//!
//! A tenant is an opaque identifier, a snapshot is identified by `(tenant,
//! timestamp)`, and a database is named `{tenant}-{timestamp}`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Opaque tenant identifier. The stable name in the alias namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing snapshot identifier (conventionally seconds since epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-side database name: `{tenant}-{timestamp}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatabaseName(String);

impl DatabaseName {
    pub fn new(tenant: &TenantId, timestamp: Timestamp) -> Self {
        Self(format!("{}-{}", tenant.as_str(), timestamp.0))
    }

    /// Reconstruct a `DatabaseName` from a raw `{tenant}-{timestamp}` string
    /// already known to be well-formed, e.g. one just read back from a
    /// catalog's own persisted state.
    pub fn from_raw(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a database name back into `(tenant, timestamp)`, given the
    /// expected tenant prefix. Returns `None` if the name does not match
    /// `{tenant}-{integer}`.
    ///
    /// Tenant identifiers may themselves contain `-`, so parsing requires the
    /// caller to supply the tenant it expects rather than guessing the split
    /// point from the right-most `-`.
    pub fn parse_for_tenant(name: &str, tenant: &TenantId) -> Option<Timestamp> {
        let prefix = format!("{}-", tenant.as_str());
        let rest = name.strip_prefix(&prefix)?;
        rest.parse::<i64>().ok().map(Timestamp)
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The key the admission set and task queue de-duplicate on.
pub type SnapshotKey = (TenantId, Timestamp);

/// A unit of work: one snapshot waiting to be (re-)loaded.
#[derive(Debug, Clone)]
pub struct Task {
    pub tenant: TenantId,
    pub timestamp: Timestamp,
    pub data_path: PathBuf,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl Task {
    pub fn new(tenant: TenantId, timestamp: Timestamp, data_path: PathBuf) -> Self {
        Self {
            tenant,
            timestamp,
            data_path,
            retry_count: 0,
            last_error: None,
        }
    }

    pub fn key(&self) -> SnapshotKey {
        (self.tenant.clone(), self.timestamp)
    }

    pub fn database_name(&self) -> DatabaseName {
        DatabaseName::new(&self.tenant, self.timestamp)
    }
}

/// Closed variant describing how a task attempt concluded: a small
/// enumerated shape, not an open-ended error type.
#[derive(Debug)]
pub enum TaskOutcome {
    Completed,
    Retrying { delay: Duration },
    Abandoned { reason: String },
}
