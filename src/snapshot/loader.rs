//! Loading snapshots back into a database.

use super::compression::open_sql;
use super::events::{EventBus, SnapshotEvent};
use super::staging_dir;
use super::types::Snapshot;
use crate::db::{DatabaseDriver, LoadMode};
use crate::disk::Storage;
use crate::error::{Error, Result};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

/// How a snapshot is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Drop every table and view before loading.
    pub drop_tables: bool,
    /// Batch or statement-by-statement execution.
    pub mode: LoadMode,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            drop_tables: true,
            mode: LoadMode::Buffered,
        }
    }
}

/// Restores snapshots into databases.
#[derive(Debug, Clone, Default)]
pub struct SnapshotLoader {
    events: EventBus,
    temporary_directory: Option<PathBuf>,
}

impl SnapshotLoader {
    pub fn new(events: EventBus) -> Self {
        Self {
            events,
            temporary_directory: None,
        }
    }

    /// Downloads snapshots under `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_temporary_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temporary_directory = Some(dir.into());
        self
    }

    /// Loads `snapshot` from `storage` into the database behind `driver`.
    ///
    /// The file is fetched before anything is dropped, so a snapshot that
    /// has vanished from the disk leaves the database untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::SnapshotNotFound`] if the file is no longer on the disk
    /// - [`Error::Storage`] if it cannot be fetched
    /// - [`Error::RestoreFailed`] if dropping tables or executing the SQL fails
    pub async fn load(
        &self,
        storage: &Storage,
        snapshot: &Snapshot,
        driver: Arc<dyn DatabaseDriver>,
        options: LoadOptions,
    ) -> Result<()> {
        self.events.publish(SnapshotEvent::Loading {
            snapshot: snapshot.clone(),
        });

        let staging = staging_dir(self.temporary_directory.as_deref())?;
        let local = staging.path().join("snapshot.sql");
        let found = storage
            .download(&snapshot.file_name, &local)
            .await
            .map_err(|e| Error::storage(format!("fetching '{}'", snapshot.file_name), &e))?;
        if !found {
            return Err(Error::not_found(&snapshot.name));
        }

        tracing::info!(
            snapshot = %snapshot.file_name,
            driver = driver.driver_name(),
            drop_tables = options.drop_tables,
            mode = ?options.mode,
            "Loading snapshot"
        );

        let compressed = snapshot.compressed;
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            if options.drop_tables {
                driver.drop_all_tables()?;
            }
            let mut reader = open_sql(&local, compressed)?;
            driver.restore(&mut reader, options.mode)
        })
        .await
        .context("Task join error")
        .and_then(|result| result)
        .map_err(|e| Error::restore_failed(&snapshot.name, &e))?;

        tracing::info!(snapshot = %snapshot.file_name, "Snapshot loaded");
        self.events.publish(SnapshotEvent::Loaded {
            snapshot: snapshot.clone(),
        });
        Ok(())
    }
}
