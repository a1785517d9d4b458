//! Listing, lookup, deletion and retention of stored snapshots.

use super::compression::gunzip_file;
use super::events::{EventBus, SnapshotEvent};
use super::types::Snapshot;
use crate::disk::Storage;
use crate::error::{Error, Result};
use anyhow::Context;
use flate2::read::MultiGzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

/// The snapshots stored on one disk.
///
/// Every call re-reads the disk listing; nothing is cached.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    storage: Storage,
    events: EventBus,
}

impl SnapshotRepository {
    pub fn new(storage: Storage, events: EventBus) -> Self {
        Self { storage, events }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// All snapshots on the disk, oldest first.
    ///
    /// Files that do not look like snapshots are skipped. Snapshots with the
    /// same timestamp are ordered by file name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the disk cannot be listed.
    pub async fn all(&self) -> Result<Vec<Snapshot>> {
        let files = self
            .storage
            .all_files()
            .await
            .map_err(|e| Error::storage(format!("listing disk '{}'", self.storage.name()), &e))?;

        let mut snapshots: Vec<Snapshot> = files
            .iter()
            .filter_map(|meta| Snapshot::from_file(self.storage.name(), meta))
            .collect();
        snapshots.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });

        tracing::debug!(
            disk = self.storage.name(),
            files = files.len(),
            snapshots = snapshots.len(),
            "Listed snapshots"
        );
        Ok(snapshots)
    }

    /// The newest snapshot whose name or file name is `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the disk cannot be listed.
    pub async fn find(&self, name: &str) -> Result<Option<Snapshot>> {
        Ok(self.all().await?.into_iter().rev().find(|s| s.matches(name)))
    }

    /// Like [`find`](Self::find), but a missing snapshot is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotNotFound`] if nothing matches.
    pub async fn get(&self, name: &str) -> Result<Snapshot> {
        self.find(name).await?.ok_or_else(|| Error::not_found(name))
    }

    /// The most recently created snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the disk cannot be listed.
    pub async fn latest(&self) -> Result<Option<Snapshot>> {
        Ok(self.all().await?.pop())
    }

    /// Deletes a snapshot's file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotNotFound`] if the file is already gone and
    /// [`Error::Storage`] if the disk refuses the delete.
    pub async fn delete(&self, snapshot: Snapshot) -> Result<()> {
        self.events.publish(SnapshotEvent::Deleting {
            snapshot: snapshot.clone(),
        });

        let existed = self
            .storage
            .delete(&snapshot.file_name)
            .await
            .map_err(|e| Error::storage(format!("deleting '{}'", snapshot.file_name), &e))?;
        if !existed {
            return Err(Error::not_found(&snapshot.name));
        }

        tracing::info!(snapshot = %snapshot.file_name, disk = %snapshot.disk, "Snapshot deleted");
        self.events.publish(SnapshotEvent::Deleted {
            file_name: snapshot.file_name,
            disk: snapshot.disk,
        });
        Ok(())
    }

    /// Deletes all but the `keep` newest snapshots.
    ///
    /// Returns the file names that were removed, oldest first.
    ///
    /// # Errors
    ///
    /// Stops at the first failed delete.
    pub async fn cleanup(&self, keep: usize) -> Result<Vec<String>> {
        let snapshots = self.all().await?;
        let excess = snapshots.len().saturating_sub(keep);

        let mut removed = Vec::with_capacity(excess);
        for snapshot in snapshots.into_iter().take(excess) {
            let file_name = snapshot.file_name.clone();
            self.delete(snapshot).await?;
            removed.push(file_name);
        }

        tracing::info!(
            disk = self.storage.name(),
            keep,
            removed = removed.len(),
            "Cleanup finished"
        );
        Ok(removed)
    }

    /// Reads a snapshot's SQL, decompressing gzip snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotNotFound`] if the file is gone and
    /// [`Error::Storage`] if it cannot be read or decoded.
    pub async fn contents(&self, snapshot: &Snapshot) -> Result<String> {
        let context = || format!("reading '{}'", snapshot.file_name);
        let data = self
            .storage
            .get(&snapshot.file_name)
            .await
            .map_err(|e| Error::storage(context(), &e))?
            .ok_or_else(|| Error::not_found(&snapshot.name))?;

        let text = if snapshot.compressed {
            let mut text = String::new();
            MultiGzDecoder::new(data.as_slice())
                .read_to_string(&mut text)
                .context("Failed to decompress snapshot")
                .map_err(|e| Error::storage(context(), &e))?;
            text
        } else {
            String::from_utf8(data)
                .context("Snapshot is not valid UTF-8")
                .map_err(|e| Error::storage(context(), &e))?
        };
        Ok(text)
    }

    /// Copies a snapshot to a local file, optionally decompressing it.
    ///
    /// Returns the number of bytes written to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotNotFound`] if the file is gone and
    /// [`Error::Storage`] if the copy fails.
    pub async fn download(&self, snapshot: &Snapshot, dest: &Path, decompress: bool) -> Result<u64> {
        let context = || format!("downloading '{}'", snapshot.file_name);

        if !(decompress && snapshot.compressed) {
            let found = self
                .storage
                .download(&snapshot.file_name, dest)
                .await
                .map_err(|e| Error::storage(context(), &e))?;
            if !found {
                return Err(Error::not_found(&snapshot.name));
            }
            let size = tokio::fs::metadata(dest)
                .await
                .map_err(|e| Error::io(format!("stat {}", dest.display()), e))?
                .len();
            return Ok(size);
        }

        let staging = tempfile::NamedTempFile::new()
            .map_err(|e| Error::io("creating download staging file", e))?;
        let found = self
            .storage
            .download(&snapshot.file_name, staging.path())
            .await
            .map_err(|e| Error::storage(context(), &e))?;
        if !found {
            return Err(Error::not_found(&snapshot.name));
        }

        let source = staging.path().to_path_buf();
        let target: PathBuf = dest.to_path_buf();
        let written = tokio::task::spawn_blocking(move || gunzip_file(&source, &target))
            .await
            .context("Task join error")
            .and_then(|result| result)
            .map_err(|e| Error::storage(context(), &e))?;
        drop(staging);
        Ok(written)
    }
}
