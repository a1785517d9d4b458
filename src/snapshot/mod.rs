//! Snapshot lifecycle: create, list, load, delete, clean up.
//!
//! A snapshot is a SQL dump stored on a [`Storage`](crate::disk::Storage)
//! disk as `<name>.sql` or `<name>.sql.gz`. The disk is the only source of
//! truth: descriptors are rebuilt from its listing every time.
//!
//! - [`SnapshotFactory`] dumps a database and stores the result
//! - [`SnapshotRepository`] lists, finds, deletes and prunes snapshots
//! - [`SnapshotLoader`] restores a snapshot into a database
//! - [`EventBus`] broadcasts a [`SnapshotEvent`] for every step
//!
//! # Example
//!
//! ```ignore
//! use dbsnap::disk::Storage;
//! use dbsnap::snapshot::{CreateOptions, EventBus, SnapshotFactory};
//!
//! let events = EventBus::default();
//! let disk = Storage::local("snapshots", "storage/snapshots")?;
//! let snapshot = SnapshotFactory::new(events)
//!     .create(&disk, driver, CreateOptions { name: Some("nightly".into()), ..Default::default() })
//!     .await?;
//! ```

mod compression;
mod events;
mod factory;
mod loader;
mod repository;
mod types;

pub use compression::gzip_bytes;
pub use events::{DEFAULT_EVENT_CAPACITY, EventBus, SnapshotEvent};
pub use factory::{CreateOptions, SnapshotFactory};
pub use loader::{LoadOptions, SnapshotLoader};
pub use repository::SnapshotRepository;
pub use types::{
    DEFAULT_NAME_FORMAT, GZIP_EXTENSION, SQL_EXTENSION, Snapshot, default_name, file_name_for,
    parse_file_name, validate_name,
};

use crate::error::{Error, Result};
use std::path::Path;
use tempfile::TempDir;

const STAGING_PREFIX: &str = "dbsnap-";

/// Private scratch directory, removed when dropped.
fn staging_dir(parent: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(STAGING_PREFIX);
    match parent {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| Error::TempDir {
                path: dir.to_path_buf(),
                source,
            })?;
            builder.tempdir_in(dir).map_err(|source| Error::TempDir {
                path: dir.to_path_buf(),
                source,
            })
        },
        None => builder.tempdir().map_err(|source| Error::TempDir {
            path: std::env::temp_dir(),
            source,
        }),
    }
}
