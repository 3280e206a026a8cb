//! CLI command implementations.
//!
//! `start` is the supervisor entry point; `list-aliases`, `cleanup`, and
//! `simulate-snapshot` are thin wrappers over the same catalog/scanner
//! primitives the supervisor uses internally.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::catalog::{Catalog, FileCatalog};
use crate::config::Config;
use crate::health::{HealthProbes, StaticProbes};
use crate::loader::{is_structurally_complete, FileLoader};
use crate::retention;
use crate::supervisor::{Collaborators, Supervisor};

use super::args::Command;
use super::errors::CliResult;

/// Run the appropriate command based on CLI args.
pub async fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Start { config } => start(&config).await,
        Command::ListAliases { config } => list_aliases(&config).await,
        Command::Cleanup { config } => cleanup(&config).await,
        Command::SimulateSnapshot {
            root,
            tenant,
            timestamp,
        } => simulate_snapshot(&root, &tenant, timestamp),
    }
}

/// The sidecar `FileCatalog` lives next to the status file, since a real
/// graph-database catalog is out of scope and no further configuration
/// option is warranted for it.
fn catalog_path(config: &Config) -> PathBuf {
    let status = Path::new(&config.status_path);
    match status.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("catalog.json"),
        _ => PathBuf::from("catalog.json"),
    }
}

/// Run the supervisor until a shutdown signal is received.
pub async fn start(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let catalog = Arc::new(FileCatalog::open(catalog_path(&config))?);
    let probes: Arc<dyn HealthProbes> = Arc::new(StaticProbes::new(catalog.clone()));
    let loader = Arc::new(FileLoader::new(Arc::clone(&catalog)));

    let collaborators = Collaborators {
        probes,
        catalog: catalog.clone(),
        loader,
    };

    let supervisor = Supervisor::bootstrap(config, collaborators, now_epoch_secs()).await?;
    let shutdown_tx = supervisor.shutdown_handle();

    let signal_task = tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("first shutdown signal received, stopping gracefully");
        let _ = shutdown_tx.send(true);
        wait_for_shutdown_signal().await;
        info!("second shutdown signal received, exiting immediately");
        std::process::exit(130);
    });

    supervisor.run().await?;
    signal_task.abort();
    Ok(())
}

/// Print the current alias -> database mapping and exit, reading the
/// catalog sidecar rather than connecting to the server directly.
pub async fn list_aliases(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let catalog = FileCatalog::open(catalog_path(&config))?;
    let aliases = catalog.list_aliases().await?;

    let mut mapping = serde_json::Map::new();
    for (tenant, target) in aliases {
        mapping.insert(
            tenant.as_str().to_string(),
            Value::String(target.as_str().to_string()),
        );
    }
    println!("{}", serde_json::to_string_pretty(&Value::Object(mapping))?);
    Ok(())
}

/// Run one retention GC pass against the configured catalog and exit.
pub async fn cleanup(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let catalog = FileCatalog::open(catalog_path(&config))?;
    let report = retention::collect_garbage(&catalog, config.retention_keep).await?;
    println!("{}", serde_json::to_string_pretty(&json!(report))?);
    Ok(())
}

/// Fabricate a well-formed snapshot fixture under the snapshot root, for
/// manual testing of the scanner and worker pipeline. A structurally
/// complete snapshot has non-empty `nodes/` and `relationships/`
/// subdirectories.
pub fn simulate_snapshot(root: &Path, tenant: &str, timestamp: i64) -> CliResult<()> {
    let dir = root.join(tenant).join(timestamp.to_string());
    let nodes = dir.join("nodes");
    let relationships = dir.join("relationships");
    std::fs::create_dir_all(&nodes)?;
    std::fs::create_dir_all(&relationships)?;
    std::fs::write(nodes.join("placeholder.csv"), b"id\n1\n")?;
    std::fs::write(
        relationships.join("placeholder.csv"),
        b"src,dst\n1,1\n",
    )?;

    debug_assert!(is_structurally_complete(&dir));

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "created": dir.display().to_string(),
            "tenant": tenant,
            "timestamp": timestamp,
        }))?
    );
    Ok(())
}

/// The first OS interrupt/terminate signal observed. Used both to trigger
/// graceful shutdown and, on a second occurrence, to exit immediately.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn now_epoch_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, snapshot_root: &Path) -> PathBuf {
        let path = dir.join("config.json");
        let body = json!({
            "snapshot_root": snapshot_root.display().to_string(),
            "status_path": dir.join("status.json").display().to_string(),
        });
        std::fs::write(&path, body.to_string()).unwrap();
        path
    }

    #[test]
    fn simulate_snapshot_creates_structurally_complete_fixture() {
        let dir = tempfile::tempdir().unwrap();
        simulate_snapshot(dir.path(), "acme", 100).unwrap();

        let snap_dir = dir.path().join("acme").join("100");
        assert!(is_structurally_complete(&snap_dir));
    }

    #[tokio::test]
    async fn list_aliases_on_fresh_catalog_prints_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_root = dir.path().join("snapshots");
        std::fs::create_dir_all(&snapshot_root).unwrap();
        let config_path = write_config(dir.path(), &snapshot_root);

        // Exercises the same load/open path `list_aliases` uses; asserts
        // it does not error when no catalog sidecar exists yet.
        let config = Config::load(&config_path).unwrap();
        let catalog = FileCatalog::open(catalog_path(&config)).unwrap();
        assert!(catalog.list_aliases().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cleanup_on_empty_catalog_reports_nothing_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_root = dir.path().join("snapshots");
        std::fs::create_dir_all(&snapshot_root).unwrap();
        let config_path = write_config(dir.path(), &snapshot_root);

        cleanup(&config_path).await.unwrap();
    }
}
