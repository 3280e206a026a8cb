//! Retention GC
//!
//! Keeps at most `keep` most-recent databases per tenant. Never drops the
//! database a tenant's alias currently points at, even if it would
//! otherwise fall outside the retained window.

use std::collections::HashMap;

use crate::catalog::{Catalog, CatalogResult};
use crate::model::{DatabaseName, TenantId};

/// What the retention pass did, for logging and tests.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct RetentionReport {
    pub dropped: Vec<String>,
    pub kept: Vec<String>,
}

/// Keep the `keep` most-recent databases per tenant; drop the rest, except
/// the current alias target, so a rollback always has somewhere to land.
pub async fn collect_garbage(
    catalog: &dyn Catalog,
    keep: usize,
) -> CatalogResult<RetentionReport> {
    let databases = catalog.list_databases().await?;
    let aliases = catalog.list_aliases().await?;

    let mut by_tenant: HashMap<TenantId, Vec<(i64, DatabaseName)>> = HashMap::new();
    for db in databases {
        if let Some((tenant, timestamp)) = split_database_name(&db) {
            by_tenant
                .entry(tenant)
                .or_default()
                .push((timestamp, db));
        }
    }

    let mut report = RetentionReport::default();

    for (tenant, mut versions) in by_tenant {
        versions.sort_by(|a, b| b.0.cmp(&a.0));
        let alias_target = aliases.get(&tenant).cloned();

        for (index, (_, name)) in versions.into_iter().enumerate() {
            let is_alias_target = alias_target.as_ref() == Some(&name);
            if index < keep || is_alias_target {
                report.kept.push(name.as_str().to_string());
            } else {
                catalog.drop_database(&name).await?;
                report.dropped.push(name.as_str().to_string());
            }
        }
    }

    Ok(report)
}

/// `{tenant}-{timestamp}` does not uniquely decompose without knowing the
/// tenant (tenant ids may themselves contain `-`), so this recovers the
/// split only for names shaped like a single-segment tenant; callers that
/// need exact tenant boundaries should prefer `DatabaseName::parse_for_tenant`.
fn split_database_name(name: &DatabaseName) -> Option<(TenantId, i64)> {
    let s = name.as_str();
    let dash = s.rfind('-')?;
    let (tenant, ts) = s.split_at(dash);
    let ts = &ts[1..];
    ts.parse::<i64>().ok().map(|ts| (TenantId::new(tenant), ts))
}
