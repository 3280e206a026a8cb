//! CLI argument definitions using clap
//!
//! Commands:
//! - tenantswitchd start --config <path>
//! - tenantswitchd list-aliases --config <path>
//! - tenantswitchd cleanup --config <path>
//! - tenantswitchd simulate-snapshot --root <path> --tenant <id> --timestamp <ts>

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Blue/green deployment supervisor for a multi-tenant graph database.
#[derive(Parser, Debug)]
#[command(name = "tenantswitchd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the supervisor until a shutdown signal is received.
    Start {
        /// Path to configuration file.
        #[arg(long, default_value = "./tenantswitch.json")]
        config: PathBuf,
    },

    /// Print the current alias -> database mapping and exit.
    ///
    /// Reads the catalog sidecar rather than connecting to the server
    /// directly; intended for operators inspecting a running supervisor.
    ListAliases {
        /// Path to configuration file.
        #[arg(long, default_value = "./tenantswitch.json")]
        config: PathBuf,
    },

    /// Run one retention GC pass against the configured catalog and exit.
    Cleanup {
        /// Path to configuration file.
        #[arg(long, default_value = "./tenantswitch.json")]
        config: PathBuf,
    },

    /// Fabricate a well-formed snapshot fixture under the snapshot root, for
    /// manual testing of the scanner and worker pipeline.
    SimulateSnapshot {
        /// Snapshot root directory.
        #[arg(long)]
        root: PathBuf,

        /// Tenant identifier.
        #[arg(long)]
        tenant: String,

        /// Snapshot timestamp (seconds since epoch).
        #[arg(long)]
        timestamp: i64,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
