//! In-memory `Catalog` test double.
//!
//! Backs the crate's own integration tests, since the real graph-database
//! driver is out of scope.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Catalog, CatalogResult};
use crate::model::{DatabaseName, TenantId};

#[derive(Default)]
struct State {
    databases: HashSet<DatabaseName>,
    aliases: HashMap<TenantId, DatabaseName>,
}

/// A `Catalog` backed by in-process state, standing in for the graph
/// database's system catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a database now exists. Called by `MemoryLoader` on a
    /// successful load, standing in for the server-side `CREATE DATABASE`
    /// a real `Load` call performs as a side effect.
    pub fn create_database(&self, name: DatabaseName) {
        self.state.lock().unwrap().databases.insert(name);
    }

    /// Snapshot of databases currently present, for assertions in tests.
    pub fn database_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.databases.iter().map(|d| d.as_str().to_string()).collect()
    }

    /// Current alias target for a tenant, for assertions in tests.
    pub fn alias_target(&self, tenant: &TenantId) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.aliases.get(tenant).map(|d| d.as_str().to_string())
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list_databases(&self) -> CatalogResult<Vec<DatabaseName>> {
        let state = self.state.lock().unwrap();
        Ok(state.databases.iter().cloned().collect())
    }

    async fn list_aliases(&self) -> CatalogResult<HashMap<TenantId, DatabaseName>> {
        let state = self.state.lock().unwrap();
        Ok(state.aliases.clone())
    }

    async fn set_alias(&self, tenant: &TenantId, target: &DatabaseName) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        state.aliases.insert(tenant.clone(), target.clone());
        Ok(())
    }

    async fn drop_alias(&self, tenant: &TenantId) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        state.aliases.remove(tenant);
        Ok(())
    }

    async fn drop_database(&self, name: &DatabaseName) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        // Idempotent: removing an absent entry is not an error.
        state.databases.remove(name);
        Ok(())
    }
}
