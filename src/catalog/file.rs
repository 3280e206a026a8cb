//! File-backed `Catalog`.
//!
//! For the CLI's `start`, `list-aliases`, and `cleanup` subcommands, which
//! need catalog state to persist across separate process invocations. A real
//! graph-database catalog is out of scope, so this substitutes a small JSON
//! sidecar file, rewritten atomically (temp-file + rename) the same way
//! `StatusPublisher` rewrites the status file.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Catalog, CatalogError, CatalogResult};
use crate::model::{DatabaseName, TenantId};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct OnDisk {
    databases: HashSet<String>,
    aliases: HashMap<String, String>,
}

pub struct FileCatalog {
    path: PathBuf,
    tmp_path: PathBuf,
    state: Mutex<OnDisk>,
}

impl FileCatalog {
    /// Load catalog state from `path`, or start empty if the file does not
    /// yet exist (first run).
    pub fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let path = path.into();
        let tmp_path = {
            let mut tmp = path.as_os_str().to_owned();
            tmp.push(".tmp");
            PathBuf::from(tmp)
        };
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| CatalogError::Unreachable(e.to_string()))?;
            serde_json::from_str(&content).map_err(|e| CatalogError::Unreachable(e.to_string()))?
        } else {
            OnDisk::default()
        };
        Ok(Self {
            path,
            tmp_path,
            state: Mutex::new(state),
        })
    }

    /// Record that a database now exists, persisting immediately. Called by
    /// the load adapter after a successful (simulated) load.
    pub async fn create_database(&self, name: DatabaseName) -> CatalogResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.databases.insert(name.as_str().to_string());
        }
        self.persist().await
    }

    async fn persist(&self) -> CatalogResult<()> {
        let snapshot = self.state.lock().unwrap().clone();
        let body = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| CatalogError::DatabaseOpFailed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CatalogError::DatabaseOpFailed(e.to_string()))?;
        }
        tokio::fs::write(&self.tmp_path, &body)
            .await
            .map_err(|e| CatalogError::DatabaseOpFailed(e.to_string()))?;
        tokio::fs::rename(&self.tmp_path, &self.path)
            .await
            .map_err(|e| CatalogError::DatabaseOpFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for FileCatalog {
    async fn list_databases(&self) -> CatalogResult<Vec<DatabaseName>> {
        let state = self.state.lock().unwrap();
        Ok(state.databases.iter().map(|s| DatabaseName::from_raw(s)).collect())
    }

    async fn list_aliases(&self) -> CatalogResult<HashMap<TenantId, DatabaseName>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .aliases
            .iter()
            .map(|(t, d)| (TenantId::new(t.clone()), DatabaseName::from_raw(d)))
            .collect())
    }

    async fn set_alias(&self, tenant: &TenantId, target: &DatabaseName) -> CatalogResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state
                .aliases
                .insert(tenant.as_str().to_string(), target.as_str().to_string());
        }
        self.persist().await
    }

    async fn drop_alias(&self, tenant: &TenantId) -> CatalogResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.aliases.remove(tenant.as_str());
        }
        self.persist().await
    }

    async fn drop_database(&self, name: &DatabaseName) -> CatalogResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.databases.remove(name.as_str());
        }
        self.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Timestamp;

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let tenant = TenantId::new("t1");

        {
            let catalog = FileCatalog::open(&path).unwrap();
            catalog
                .create_database(DatabaseName::new(&tenant, Timestamp(100)))
                .await
                .unwrap();
            catalog
                .set_alias(&tenant, &DatabaseName::new(&tenant, Timestamp(100)))
                .await
                .unwrap();
        }

        let reopened = FileCatalog::open(&path).unwrap();
        let aliases = reopened.list_aliases().await.unwrap();
        assert_eq!(
            aliases.get(&tenant).map(|d| d.as_str()),
            Some("t1-100")
        );
        assert!(!tempfile_exists(&path));
    }

    fn tempfile_exists(path: &Path) -> bool {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp).exists()
    }
}
