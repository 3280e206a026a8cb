//! Snapshot Scanner
//!
//! Discovers new, structurally complete snapshots on the shared filesystem.
//! A pure function of filesystem state at call time, with no memory of what
//! it has seen before; de-duplication is the `TaskQueue`'s responsibility.

mod errors;

pub use errors::{ScannerError, ScannerResult};

use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::is_structurally_complete;
use crate::model::{TenantId, Timestamp};

/// One discovered, structurally complete snapshot.
#[derive(Debug, Clone)]
pub struct DiscoveredSnapshot {
    pub tenant: TenantId,
    pub timestamp: Timestamp,
    pub path: PathBuf,
}

/// Walks a configured root directory for snapshot candidates.
pub struct SnapshotScanner {
    root: PathBuf,
}

impl SnapshotScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Verify the root exists and is a readable directory. Called once at
    /// supervisor startup.
    pub fn verify_root(&self) -> ScannerResult<()> {
        let meta = fs::metadata(&self.root)
            .map_err(|_| ScannerError::RootMissing(self.root.display().to_string()))?;
        if !meta.is_dir() {
            return Err(ScannerError::RootMissing(self.root.display().to_string()));
        }
        fs::read_dir(&self.root)
            .map_err(|e| ScannerError::RootUnreadable(format!("{}: {e}", self.root.display())))?;
        Ok(())
    }

    /// Enumerate qualifying `(tenant, timestamp, path)` tuples.
    ///
    /// Ordering across tenants is unspecified; within a tenant, results are
    /// ascending by timestamp so startup catch-up processes older snapshots
    /// first.
    pub fn scan(&self) -> ScannerResult<Vec<DiscoveredSnapshot>> {
        let mut out = Vec::new();
        let mut skipped = 0usize;

        let tenant_dirs = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => return Err(ScannerError::RootUnreadable(e.to_string())),
        };

        for tenant_entry in tenant_dirs.flatten() {
            let tenant_path = tenant_entry.path();
            if !tenant_path.is_dir() {
                continue;
            }
            let Some(tenant_name) = tenant_entry.file_name().to_str().map(str::to_string) else {
                skipped += 1;
                continue;
            };
            let tenant = TenantId::new(tenant_name);

            let mut candidates: Vec<(Timestamp, PathBuf)> = Vec::new();
            let Ok(snapshot_dirs) = fs::read_dir(&tenant_path) else {
                continue;
            };
            for snap_entry in snapshot_dirs.flatten() {
                let snap_path = snap_entry.path();
                if !snap_path.is_dir() {
                    continue;
                }
                let Some(name) = snap_entry.file_name().to_str().map(str::to_string) else {
                    skipped += 1;
                    continue;
                };
                let Ok(ts) = name.parse::<i64>() else {
                    // Non-integer names are not snapshots; skip silently.
                    continue;
                };
                if is_structurally_complete(&snap_path) {
                    candidates.push((Timestamp(ts), snap_path));
                } else {
                    skipped += 1;
                }
            }

            candidates.sort_by_key(|(ts, _)| *ts);
            for (timestamp, path) in candidates {
                out.push(DiscoveredSnapshot {
                    tenant: tenant.clone(),
                    timestamp,
                    path,
                });
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, "scanner skipped incomplete or malformed candidates");
        }

        Ok(out)
    }
}

/// Convenience for callers that only have a root `&Path`.
pub fn scan_root(root: &Path) -> ScannerResult<Vec<DiscoveredSnapshot>> {
    SnapshotScanner::new(root).scan()
}
