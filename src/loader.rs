//! Loader
//!
//! The bulk-ingest data path is deliberately out of scope; the supervisor
//! treats it as an opaque collaborator reached only through this trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{FileCatalog, MemoryCatalog};
use crate::model::{DatabaseName, SnapshotKey, TenantId, Timestamp};

/// Loader errors, distinguishing retryable from non-retryable failures.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// Network blip, deadlock, timeout, transient server error, retried
    /// with backoff.
    #[error("transient load failure: {0}")]
    Transient(String),

    /// Structurally malformed input the loader can positively classify as
    /// unrecoverable, abandoned immediately.
    #[error("permanent load failure: {0}")]
    Permanent(String),
}

impl LoadError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::Transient(_))
    }
}

/// Creates a server-side database from a snapshot's columnar files and
/// commits it. Blocking; idempotence is not required.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(
        &self,
        tenant: &TenantId,
        timestamp: Timestamp,
        data_path: &Path,
    ) -> Result<(), LoadError>;
}

/// In-memory `Loader` test double.
///
/// Lets tests script a sequence of outcomes per `(tenant, timestamp)`, e.g.
/// "fail twice then succeed", and records every attempted data path for
/// assertions.
pub struct MemoryLoader {
    /// Scripted outcomes per key, consumed front-to-back; once exhausted,
    /// further calls succeed.
    scripts: Mutex<HashMap<SnapshotKey, Vec<LoadScript>>>,
    attempts: Mutex<HashMap<SnapshotKey, u32>>,
    catalog: std::sync::Arc<MemoryCatalog>,
}

/// One scripted outcome for a `MemoryLoader` call.
#[derive(Debug, Clone)]
pub enum LoadScript {
    Succeed,
    Transient(String),
    Permanent(String),
}

impl MemoryLoader {
    pub fn new(catalog: std::sync::Arc<MemoryCatalog>) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            attempts: Mutex::new(HashMap::new()),
            catalog,
        }
    }

    /// Script the outcomes for a given `(tenant, timestamp)`, consumed in
    /// order on successive `load` calls.
    pub fn script(&self, tenant: TenantId, timestamp: Timestamp, outcomes: Vec<LoadScript>) {
        self.scripts
            .lock()
            .unwrap()
            .insert((tenant, timestamp), outcomes);
    }

    /// Number of times `load` was called for this key.
    pub fn attempt_count(&self, tenant: &TenantId, timestamp: Timestamp) -> u32 {
        *self
            .attempts
            .lock()
            .unwrap()
            .get(&(tenant.clone(), timestamp))
            .unwrap_or(&0)
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    async fn load(
        &self,
        tenant: &TenantId,
        timestamp: Timestamp,
        _data_path: &Path,
    ) -> Result<(), LoadError> {
        let key: SnapshotKey = (tenant.clone(), timestamp);

        {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts.entry(key.clone()).or_insert(0) += 1;
        }

        let next = {
            let mut scripts = self.scripts.lock().unwrap();
            scripts.get_mut(&key).and_then(|v| {
                if v.is_empty() {
                    None
                } else {
                    Some(v.remove(0))
                }
            })
        };

        match next {
            None | Some(LoadScript::Succeed) => {
                self.catalog.create_database(DatabaseName::new(tenant, timestamp));
                Ok(())
            }
            Some(LoadScript::Transient(msg)) => Err(LoadError::Transient(msg)),
            Some(LoadScript::Permanent(msg)) => Err(LoadError::Permanent(msg)),
        }
    }
}

/// `Loader` adapter for the CLI's `start` command, registering the database
/// in a `FileCatalog` once the (opaque, out-of-scope) bulk ingest path would
/// have finished.
///
/// Unconditionally succeeds: the real bulk-ingest data path is out of
/// scope, so there is nothing here to fail against beyond the
/// structural-completeness check the scanner already performed.
pub struct FileLoader {
    catalog: std::sync::Arc<FileCatalog>,
}

impl FileLoader {
    pub fn new(catalog: std::sync::Arc<FileCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Loader for FileLoader {
    async fn load(
        &self,
        tenant: &TenantId,
        timestamp: Timestamp,
        _data_path: &Path,
    ) -> Result<(), LoadError> {
        self.catalog
            .create_database(DatabaseName::new(tenant, timestamp))
            .await
            .map_err(|e| LoadError::Transient(e.to_string()))?;
        Ok(())
    }
}

/// Structural-completeness check for a snapshot directory, shared by the
/// scanner (to decide what to emit) and the CLI's `simulate-snapshot`
/// wrapper (to fabricate a well-formed fixture).
///
/// A snapshot directory is complete iff both `nodes/` and `relationships/`
/// exist and each contains at least one entry.
pub fn is_structurally_complete(snapshot_dir: &Path) -> bool {
    has_nonempty_subdir(snapshot_dir, "nodes") && has_nonempty_subdir(snapshot_dir, "relationships")
}

fn has_nonempty_subdir(parent: &Path, name: &str) -> bool {
    let dir = parent.join(name);
    match std::fs::read_dir(&dir) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}

/// Path convention for a snapshot directory under the configured root.
pub fn snapshot_dir(root: &Path, tenant: &TenantId, timestamp: Timestamp) -> PathBuf {
    root.join(tenant.as_str()).join(timestamp.0.to_string())
}
