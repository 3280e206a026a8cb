//! CLI module.
//!
//! Provides the command-line interface for the supervisor binary:
//! - `start`: run the supervisor until a shutdown signal is received
//! - `list-aliases`, `cleanup`, `simulate-snapshot`: thin wrappers over the
//!   same catalog/scanner primitives the supervisor uses internally

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{cleanup, list_aliases, run_command, simulate_snapshot, start};
pub use errors::{CliError, CliResult};
