//! Backend trait for snapshot disks.
//!
//! Defines the capability set every storage backend must provide, enabling
//! pluggable storage (local directory, memory, object storage, etc.). The
//! snapshot engine relies on nothing beyond byte storage and name-based
//! retrieval.

use super::types::FileMeta;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// Backend trait for snapshot storage.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
///
/// # Example
///
/// ```ignore
/// use dbsnap::disk::{Disk, MemoryDisk};
///
/// let disk = MemoryDisk::new();
/// disk.put("nightly.sql", b"CREATE TABLE t (id INTEGER);").await?;
/// assert!(disk.exists("nightly.sql").await?);
/// ```
#[async_trait]
pub trait Disk: Send + Sync + 'static {
    /// Stores a file, replacing any existing file at the same path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the write fails.
    async fn put(&self, path: &str, data: &[u8]) -> Result<FileMeta>;

    /// Stores the contents of a local file.
    ///
    /// Backends that can stream should override this; the default reads the
    /// whole file into memory and calls [`Disk::put`]. Either way the stored
    /// file must never be observable in a partially written state.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the write fails.
    async fn put_file(&self, path: &str, source: &Path) -> Result<FileMeta> {
        let data = tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read upload source: {}", source.display()))?;
        self.put(path, &data).await
    }

    /// Retrieves a file's contents.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the read fails.
    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Copies a file to a local destination.
    ///
    /// Returns `Ok(false)` if the file does not exist. The default goes
    /// through [`Disk::get`].
    ///
    /// # Errors
    ///
    /// Returns an error if the read or the local write fails.
    async fn download(&self, path: &str, dest: &Path) -> Result<bool> {
        let Some(data) = self.get(path).await? else {
            return Ok(false);
        };
        tokio::fs::write(dest, &data)
            .await
            .with_context(|| format!("Failed to write download target: {}", dest.display()))?;
        Ok(true)
    }

    /// Deletes a file.
    ///
    /// Returns `Ok(true)` if the file existed and was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or deletion fails.
    async fn delete(&self, path: &str) -> Result<bool>;

    /// Whether a file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or metadata cannot be read.
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.head(path).await?.is_some())
    }

    /// Retrieves file metadata without reading the contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or metadata cannot be read.
    async fn head(&self, path: &str) -> Result<Option<FileMeta>>;

    /// Lists every file on the disk, recursively, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    async fn all_files(&self) -> Result<Vec<FileMeta>>;
}
