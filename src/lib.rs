//! tenantswitch - a blue/green deployment supervisor for a multi-tenant
//! graph database.
//!
//! Tenant snapshots arrive on shared storage; the supervisor discovers them,
//! loads each into an isolated database, swaps a stable per-tenant alias
//! onto the new database, and retires obsolete ones, without downtime for
//! readers addressing the database by its alias.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod health;
pub mod loader;
pub mod model;
pub mod queue;
pub mod retention;
pub mod scanner;
pub mod stats;
pub mod status;
pub mod supervisor;
pub mod worker;
