//! Named disk handle over any `Disk` backend.

use super::backend::Disk;
use super::local::LocalDisk;
use super::memory::MemoryDisk;
use super::types::FileMeta;
use anyhow::Result;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A configured disk: a name plus the backend that stores its files.
///
/// `Storage` is `Clone` and can be shared across tasks; clones point at the
/// same backend.
///
/// # Example
///
/// ```ignore
/// use dbsnap::disk::Storage;
///
/// let disk = Storage::local("snapshots", "storage/snapshots")?;
/// let files = disk.all_files().await?;
/// ```
#[derive(Clone)]
pub struct Storage {
    name: String,
    backend: Arc<dyn Disk>,
}

impl Storage {
    /// Creates a disk backed by a local directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn local<P: AsRef<Path>>(name: impl Into<String>, root: P) -> Result<Self> {
        Ok(Self::custom(name, LocalDisk::open(root)?))
    }

    /// Creates a disk backed by an in-memory store.
    pub fn memory(name: impl Into<String>) -> Self {
        Self::custom(name, MemoryDisk::new())
    }

    /// Creates a disk with a custom backend (object storage, etc.).
    pub fn custom<B: Disk>(name: impl Into<String>, backend: B) -> Self {
        Self {
            name: name.into(),
            backend: Arc::new(backend),
        }
    }

    /// Creates a disk from a boxed backend.
    pub fn from_boxed(name: impl Into<String>, backend: Box<dyn Disk>) -> Self {
        Self {
            name: name.into(),
            backend: Arc::from(backend),
        }
    }

    /// Name the disk was configured under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the write fails.
    pub async fn put(&self, path: &str, data: &[u8]) -> Result<FileMeta> {
        self.backend.put(path, data).await
    }

    /// Stores the contents of a local file.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the write fails.
    pub async fn put_file(&self, path: &str, source: &Path) -> Result<FileMeta> {
        self.backend.put_file(path, source).await
    }

    /// Retrieves a file's contents, `Ok(None)` if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the read fails.
    pub async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        self.backend.get(path).await
    }

    /// Copies a file to a local path, `Ok(false)` if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or local write fails.
    pub async fn download(&self, path: &str, dest: &Path) -> Result<bool> {
        self.backend.download(path, dest).await
    }

    /// Deletes a file, `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or deletion fails.
    pub async fn delete(&self, path: &str) -> Result<bool> {
        self.backend.delete(path).await
    }

    /// Whether a file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata cannot be read.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        self.backend.exists(path).await
    }

    /// File metadata, `Ok(None)` if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata cannot be read.
    pub async fn head(&self, path: &str) -> Result<Option<FileMeta>> {
        self.backend.head(path).await
    }

    /// Every file on the disk, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn all_files(&self) -> Result<Vec<FileMeta>> {
        self.backend.all_files().await
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage").field("name", &self.name).finish()
    }
}
