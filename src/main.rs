//! tenantswitchd entry point.
//!
//! Parses arguments, initializes structured logging, and dispatches to the
//! CLI layer. Never touches a supervisor collaborator directly.

use std::process;

use tenantswitch::cli::{run_command, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse_args();

    if let Err(e) = run_command(cli.command).await {
        let error_json = serde_json::json!({
            "status": "error",
            "code": e.code_str(),
            "message": e.to_string(),
        });
        eprintln!("{error_json}");
        process::exit(1);
    }
}
