//! Local-directory disk backend.
//!
//! Files live directly under a root directory. Timestamps come from the
//! filesystem's modification time, so no separate metadata store is kept.
//! Writes go to a temporary sibling file that is renamed into place.

use super::backend::Disk;
use super::types::FileMeta;
use super::validation::{RESERVED_PREFIX, file_path};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Prefix of in-flight upload files; they are never listed.
const UPLOAD_PREFIX: &str = ".dbsnap-upload-";

/// Disk backend rooted at a local directory.
///
/// `LocalDisk` is `Clone` and can be shared across threads.
#[derive(Clone, Debug)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    /// Opens the disk at the given root, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create disk directory: {}", root.display()))?;
        Ok(Self { root })
    }

    /// Root directory of the disk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn put_sync(&self, path: &str, data: &[u8]) -> Result<FileMeta> {
        let target = file_path(&self.root, path)?;
        let mut staged = self.stage(&target, path)?;
        staged
            .write_all(data)
            .with_context(|| format!("Failed to write file: {path}"))?;
        self.commit(staged, &target, path)
    }

    fn put_file_sync(&self, path: &str, source: &Path) -> Result<FileMeta> {
        let target = file_path(&self.root, path)?;
        let mut input = fs::File::open(source)
            .with_context(|| format!("Failed to open upload source: {}", source.display()))?;
        let mut staged = self.stage(&target, path)?;
        io::copy(&mut input, &mut staged)
            .with_context(|| format!("Failed to write file: {path}"))?;
        self.commit(staged, &target, path)
    }

    /// Creates the temporary file a write goes to before it is renamed.
    fn stage(&self, target: &Path, path: &str) -> Result<NamedTempFile> {
        let parent = target.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directories for: {path}"))?;
        tempfile::Builder::new()
            .prefix(UPLOAD_PREFIX)
            .tempfile_in(parent)
            .with_context(|| format!("Failed to create staging file for: {path}"))
    }

    fn commit(&self, staged: NamedTempFile, target: &Path, path: &str) -> Result<FileMeta> {
        staged
            .as_file()
            .sync_all()
            .with_context(|| format!("Failed to flush file: {path}"))?;
        staged
            .persist(target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to move file into place: {path}"))?;
        tracing::debug!(path, root = %self.root.display(), "Stored file");
        file_meta(target, path)
    }

    fn get_sync(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let target = file_path(&self.root, path)?;
        if !target.is_file() {
            return Ok(None);
        }
        let data = fs::read(&target).with_context(|| format!("Failed to read file: {path}"))?;
        Ok(Some(data))
    }

    fn download_sync(&self, path: &str, dest: &Path) -> Result<bool> {
        let target = file_path(&self.root, path)?;
        if !target.is_file() {
            return Ok(false);
        }
        fs::copy(&target, dest).with_context(|| {
            format!("Failed to copy file {path} to {}", dest.display())
        })?;
        Ok(true)
    }

    fn delete_sync(&self, path: &str) -> Result<bool> {
        let target = file_path(&self.root, path)?;
        if !target.is_file() {
            return Ok(false);
        }
        fs::remove_file(&target).with_context(|| format!("Failed to delete file: {path}"))?;
        Ok(true)
    }

    fn head_sync(&self, path: &str) -> Result<Option<FileMeta>> {
        let target = file_path(&self.root, path)?;
        if !target.is_file() {
            return Ok(None);
        }
        file_meta(&target, path).map(Some)
    }

    fn all_files_sync(&self) -> Result<Vec<FileMeta>> {
        let mut files = Vec::new();
        scan_directory(&self.root, &self.root, &mut files)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

fn file_meta(target: &Path, path: &str) -> Result<FileMeta> {
    let metadata =
        fs::metadata(target).with_context(|| format!("Failed to get file metadata: {path}"))?;
    let modified = metadata
        .modified()
        .with_context(|| format!("Failed to get modification time: {path}"))?;
    Ok(FileMeta {
        path: path.replace('\\', "/"),
        size: metadata.len(),
        last_modified: DateTime::<Utc>::from(modified),
    })
}

/// Recursively collects files below `dir`, relative to `root`.
fn scan_directory(root: &Path, dir: &Path, files: &mut Vec<FileMeta>) -> Result<()> {
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if entry
            .file_name()
            .to_string_lossy()
            .starts_with(RESERVED_PREFIX)
        {
            continue;
        }

        if path.is_dir() {
            scan_directory(root, &path, files)?;
        } else if path.is_file()
            && let Ok(relative) = path.strip_prefix(root)
        {
            let relative = relative.to_string_lossy().replace('\\', "/");
            files.push(file_meta(&path, &relative)?);
        }
    }

    Ok(())
}

#[async_trait]
impl Disk for LocalDisk {
    async fn put(&self, path: &str, data: &[u8]) -> Result<FileMeta> {
        let disk = self.clone();
        let path = path.to_string();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || disk.put_sync(&path, &data))
            .await
            .context("Task join error")?
    }

    async fn put_file(&self, path: &str, source: &Path) -> Result<FileMeta> {
        let disk = self.clone();
        let path = path.to_string();
        let source = source.to_path_buf();
        tokio::task::spawn_blocking(move || disk.put_file_sync(&path, &source))
            .await
            .context("Task join error")?
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let disk = self.clone();
        let path = path.to_string();
        tokio::task::spawn_blocking(move || disk.get_sync(&path))
            .await
            .context("Task join error")?
    }

    async fn download(&self, path: &str, dest: &Path) -> Result<bool> {
        let disk = self.clone();
        let path = path.to_string();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || disk.download_sync(&path, &dest))
            .await
            .context("Task join error")?
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        let disk = self.clone();
        let path = path.to_string();
        tokio::task::spawn_blocking(move || disk.delete_sync(&path))
            .await
            .context("Task join error")?
    }

    async fn head(&self, path: &str) -> Result<Option<FileMeta>> {
        let disk = self.clone();
        let path = path.to_string();
        tokio::task::spawn_blocking(move || disk.head_sync(&path))
            .await
            .context("Task join error")?
    }

    async fn all_files(&self) -> Result<Vec<FileMeta>> {
        let disk = self.clone();
        tokio::task::spawn_blocking(move || disk.all_files_sync())
            .await
            .context("Task join error")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_disk() -> (LocalDisk, TempDir) {
        let tmp = TempDir::new().unwrap();
        let disk = LocalDisk::open(tmp.path().join("snapshots")).unwrap();
        (disk, tmp)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (disk, _tmp) = create_disk();

        let meta = disk.put("a.sql", b"SELECT 1;").await.unwrap();
        assert_eq!(meta.path, "a.sql");
        assert_eq!(meta.size, 9);

        let data = disk.get("a.sql").await.unwrap().unwrap();
        assert_eq!(data, b"SELECT 1;");
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let (disk, _tmp) = create_disk();
        assert!(disk.get("missing.sql").await.unwrap().is_none());
        assert!(!disk.exists("missing.sql").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_file_streams_from_source() {
        let (disk, tmp) = create_disk();
        let source = tmp.path().join("dump.sql");
        fs::write(&source, b"CREATE TABLE t (id INTEGER);").unwrap();

        let meta = disk.put_file("nested/dump.sql", &source).await.unwrap();
        assert_eq!(meta.size, 28);
        assert!(disk.root().join("nested").join("dump.sql").is_file());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (disk, _tmp) = create_disk();
        disk.put("a.sql", b"original").await.unwrap();
        disk.put("a.sql", b"updated").await.unwrap();

        assert_eq!(disk.get("a.sql").await.unwrap().unwrap(), b"updated");
        assert_eq!(disk.all_files().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_put_file_leaves_nothing() {
        let (disk, tmp) = create_disk();
        let result = disk
            .put_file("a.sql", &tmp.path().join("does-not-exist.sql"))
            .await;
        assert!(result.is_err());
        assert!(disk.all_files().await.unwrap().is_empty());
        assert_eq!(fs::read_dir(disk.root()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (disk, _tmp) = create_disk();
        disk.put("a.sql", b"x").await.unwrap();

        assert!(disk.delete("a.sql").await.unwrap());
        assert!(!disk.delete("a.sql").await.unwrap());
        assert!(disk.head("a.sql").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_files_recursive_and_sorted() {
        let (disk, _tmp) = create_disk();
        disk.put("z.sql", b"z").await.unwrap();
        disk.put("a.sql", b"a").await.unwrap();
        disk.put("dir/m.sql", b"m").await.unwrap();

        let paths: Vec<String> = disk
            .all_files()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.path)
            .collect();
        assert_eq!(paths, vec!["a.sql", "dir/m.sql", "z.sql"]);
    }

    #[tokio::test]
    async fn test_staging_files_are_not_listed() {
        let (disk, _tmp) = create_disk();
        fs::write(disk.root().join(format!("{UPLOAD_PREFIX}abc")), b"partial").unwrap();
        disk.put("a.sql", b"a").await.unwrap();

        let files = disk.all_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "a.sql");
    }

    #[tokio::test]
    async fn test_upload_names_cannot_be_written() {
        let (disk, _tmp) = create_disk();
        let err = disk
            .put(&format!("{UPLOAD_PREFIX}abc"), b"x")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reserved"));
        assert!(disk.all_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download() {
        let (disk, tmp) = create_disk();
        disk.put("a.sql", b"data").await.unwrap();

        let dest = tmp.path().join("out.sql");
        assert!(disk.download("a.sql", &dest).await.unwrap());
        assert_eq!(fs::read(&dest).unwrap(), b"data");
        assert!(!disk.download("b.sql", &dest).await.unwrap());
    }

    #[tokio::test]
    async fn test_path_traversal_prevention() {
        let (disk, _tmp) = create_disk();
        for path in ["../escape.sql", "/etc/passwd", "a/../../b.sql"] {
            assert!(disk.put(path, b"x").await.is_err(), "accepted: {path}");
        }
    }
}
