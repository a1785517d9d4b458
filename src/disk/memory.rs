//! In-memory disk backend.
//!
//! Provides a fast, non-persistent file store using DashMap for concurrent
//! access. Used for tests and for embedding the engine without touching the
//! filesystem.

use super::backend::Disk;
use super::types::FileMeta;
use super::validation::normalized_key;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

/// Entry stored in the memory backend.
#[derive(Clone)]
struct MemoryFile {
    data: Vec<u8>,
    meta: FileMeta,
}

/// In-memory disk backend.
///
/// All data is lost when the last clone is dropped. Clones share the same
/// underlying map, so a test can keep one handle while the engine uses
/// another.
#[derive(Clone, Default)]
pub struct MemoryDisk {
    files: Arc<DashMap<String, MemoryFile>>,
}

impl MemoryDisk {
    /// Creates a new empty in-memory disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of files on the disk.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the disk holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Removes every file.
    pub fn clear(&self) {
        self.files.clear();
    }
}

#[async_trait]
impl Disk for MemoryDisk {
    async fn put(&self, path: &str, data: &[u8]) -> Result<FileMeta> {
        let key = normalized_key(path)?;
        let meta = FileMeta {
            path: key.clone(),
            size: data.len() as u64,
            last_modified: Utc::now(),
        };
        self.files.insert(
            key,
            MemoryFile {
                data: data.to_vec(),
                meta: meta.clone(),
            },
        );
        Ok(meta)
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let key = normalized_key(path)?;
        Ok(self.files.get(&key).map(|entry| entry.value().data.clone()))
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let key = normalized_key(path)?;
        Ok(self.files.remove(&key).is_some())
    }

    async fn head(&self, path: &str) -> Result<Option<FileMeta>> {
        let key = normalized_key(path)?;
        Ok(self.files.get(&key).map(|entry| entry.value().meta.clone()))
    }

    async fn all_files(&self) -> Result<Vec<FileMeta>> {
        let mut files: Vec<FileMeta> = self
            .files
            .iter()
            .map(|entry| entry.value().meta.clone())
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}
