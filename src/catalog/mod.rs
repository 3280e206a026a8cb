//! Catalog / Alias operations
//!
//! The external collaborator seam for database and alias management. The
//! supervisor only ever calls these operations; it never manages its own
//! client-side lock over the server, which enforces its own concurrency for
//! catalog operations.

mod errors;
mod file;
mod memory;

pub use errors::{CatalogError, CatalogResult};
pub use file::FileCatalog;
pub use memory::MemoryCatalog;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{DatabaseName, TenantId};

/// Database and alias management primitives exposed by the graph database.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Names of all user databases.
    async fn list_databases(&self) -> CatalogResult<Vec<DatabaseName>>;

    /// Current alias -> target database mapping.
    async fn list_aliases(&self) -> CatalogResult<HashMap<TenantId, DatabaseName>>;

    /// Create or update an alias. Idempotent.
    async fn set_alias(&self, tenant: &TenantId, target: &DatabaseName) -> CatalogResult<()>;

    /// Remove an alias. Idempotent.
    async fn drop_alias(&self, tenant: &TenantId) -> CatalogResult<()>;

    /// Drop a database. Idempotent; tolerates "not found".
    async fn drop_database(&self, name: &DatabaseName) -> CatalogResult<()>;
}
