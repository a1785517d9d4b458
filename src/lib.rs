//! dbsnap - database snapshots on pluggable storage disks.
//!
//! Create SQL dumps of a database, store them on a disk (local directory,
//! memory, or a custom backend such as object storage), list them, load them
//! back, and prune old ones.
//!
//! - [`disk`] - Storage backends ([`disk::Disk`], [`disk::Storage`])
//! - [`db`] - Database drivers for SQLite, MySQL and PostgreSQL
//! - [`snapshot`] - Snapshot lifecycle engine and events
//! - [`config`] - `dbsnap.toml` configuration
//! - [`app`] - Wiring configuration into disks and drivers
//! - [`commands`] - CLI command handlers

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod db;
pub mod disk;
pub mod error;
pub mod snapshot;
pub mod ui;
pub mod utils;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
pub use snapshot::{Snapshot, SnapshotEvent};
