//! Snapshot creation.

use super::compression::gzip_file;
use super::events::{EventBus, SnapshotEvent};
use super::staging_dir;
use super::types::{Snapshot, default_name, file_name_for, validate_name};
use crate::db::{DatabaseDriver, DumpOptions};
use crate::disk::Storage;
use crate::error::{Error, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;

/// What to snapshot and how.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Snapshot name; a timestamp is used when `None`.
    pub name: Option<String>,
    /// Name of the connection being dumped, for events and errors.
    pub connection: String,
    /// Gzip the dump before storing it.
    pub compress: bool,
    /// Table selection and extra dump arguments.
    pub dump: DumpOptions,
}

/// Takes database dumps and stores them as snapshots.
///
/// The dump is produced in a private temporary directory and only uploaded
/// once complete, so a failed dump never leaves a file on the disk.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFactory {
    events: EventBus,
    temporary_directory: Option<PathBuf>,
}

impl SnapshotFactory {
    pub fn new(events: EventBus) -> Self {
        Self {
            events,
            temporary_directory: None,
        }
    }

    /// Stages dumps under `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_temporary_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temporary_directory = Some(dir.into());
        self
    }

    /// Dumps the database behind `driver` onto `storage`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] / [`Error::InvalidOptions`] before anything runs
    /// - [`Error::DumpFailed`] if the driver (or compression) fails
    /// - [`Error::StorageWriteFailed`] if the disk rejects the upload
    pub async fn create(
        &self,
        storage: &Storage,
        driver: Arc<dyn DatabaseDriver>,
        options: CreateOptions,
    ) -> Result<Snapshot> {
        options.dump.validate()?;
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| default_name(Local::now()));
        validate_name(&name)?;
        let file_name = file_name_for(&name, options.compress);

        self.events.publish(SnapshotEvent::Creating {
            file_name: file_name.clone(),
            disk: storage.name().to_string(),
            connection: options.connection.clone(),
            tables: options.dump.tables.clone(),
            exclude: options.dump.exclude.clone(),
        });

        let staging = staging_dir(self.temporary_directory.as_deref())?;
        let dump_path = staging.path().join(file_name_for(&name, false));
        let compress = options.compress;
        let dump = options.dump.clone();

        tracing::info!(
            snapshot = %file_name,
            disk = storage.name(),
            connection = %options.connection,
            driver = driver.driver_name(),
            "Creating snapshot"
        );

        let upload_path = tokio::task::spawn_blocking(move || -> anyhow::Result<PathBuf> {
            driver.dump(&dump_path, &dump)?;
            if !compress {
                return Ok(dump_path);
            }
            let gz_path = dump_path.with_extension("sql.gz");
            gzip_file(&dump_path, &gz_path)?;
            std::fs::remove_file(&dump_path).with_context(|| {
                format!("Failed to remove uncompressed dump: {}", dump_path.display())
            })?;
            Ok(gz_path)
        })
        .await
        .context("Task join error")
        .and_then(|result| result)
        .map_err(|e| Error::dump_failed(&options.connection, &e))?;

        let meta = storage
            .put_file(&file_name, &upload_path)
            .await
            .map_err(|e| Error::storage_write_failed(&file_name, &e))?;

        let snapshot = Snapshot::from_file(storage.name(), &meta)
            .ok_or_else(|| Error::invalid_name(&name, "stored file is not a snapshot"))?;

        tracing::info!(
            snapshot = %snapshot.file_name,
            size = snapshot.size,
            "Snapshot created"
        );
        self.events.publish(SnapshotEvent::Created {
            snapshot: snapshot.clone(),
        });

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteDriver;
    use crate::disk::{Disk, FileMeta};
    use std::path::Path;

    struct FailingDriver;

    impl DatabaseDriver for FailingDriver {
        fn driver_name(&self) -> &'static str {
            "failing"
        }
        fn dump(&self, dest: &Path, _options: &DumpOptions) -> anyhow::Result<()> {
            std::fs::write(dest, "CREATE TABLE half")?;
            anyhow::bail!("connection reset")
        }
        fn table_names(&self) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn drop_all_tables(&self) -> anyhow::Result<()> {
            Ok(())
        }
        fn execute(&self, _sql: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Disk that refuses every write.
    struct ReadOnlyDisk;

    #[async_trait::async_trait]
    impl Disk for ReadOnlyDisk {
        async fn put(&self, path: &str, _data: &[u8]) -> anyhow::Result<FileMeta> {
            anyhow::bail!("bucket is read-only: {path}")
        }
        async fn put_file(&self, path: &str, _source: &Path) -> anyhow::Result<FileMeta> {
            anyhow::bail!("bucket is read-only: {path}")
        }
        async fn get(&self, _path: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Ok(None)
        }
        async fn delete(&self, _path: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn head(&self, _path: &str) -> anyhow::Result<Option<FileMeta>> {
            Ok(None)
        }
        async fn all_files(&self) -> anyhow::Result<Vec<FileMeta>> {
            Ok(Vec::new())
        }
    }

    fn sqlite() -> Arc<dyn DatabaseDriver> {
        let driver = SqliteDriver::in_memory().unwrap();
        driver
            .execute("CREATE TABLE models (id INTEGER PRIMARY KEY, name TEXT); INSERT INTO models (name) VALUES ('a');")
            .unwrap();
        Arc::new(driver)
    }

    fn options(name: &str) -> CreateOptions {
        CreateOptions {
            name: Some(name.to_string()),
            connection: "default".to_string(),
            ..CreateOptions::default()
        }
    }

    #[tokio::test]
    async fn test_create_plain_snapshot() {
        let storage = Storage::memory("snapshots");
        let factory = SnapshotFactory::default();

        let snapshot = factory
            .create(&storage, sqlite(), options("my-snapshot"))
            .await
            .unwrap();

        assert_eq!(snapshot.file_name, "my-snapshot.sql");
        assert_eq!(snapshot.name, "my-snapshot");
        assert!(!snapshot.compressed);
        let body = storage.get("my-snapshot.sql").await.unwrap().unwrap();
        assert!(String::from_utf8(body).unwrap().contains("INSERT INTO \"models\""));
    }

    #[tokio::test]
    async fn test_create_compressed_snapshot() {
        let storage = Storage::memory("snapshots");
        let factory = SnapshotFactory::default();

        let snapshot = factory
            .create(
                &storage,
                sqlite(),
                CreateOptions {
                    compress: true,
                    ..options("packed")
                },
            )
            .await
            .unwrap();

        assert_eq!(snapshot.file_name, "packed.sql.gz");
        assert!(snapshot.compressed);
        let body = storage.get("packed.sql.gz").await.unwrap().unwrap();
        assert_eq!(&body[..2], &[0x1f, 0x8b]);
    }

    #[tokio::test]
    async fn test_default_name_is_timestamp() {
        let storage = Storage::memory("snapshots");
        let snapshot = SnapshotFactory::default()
            .create(
                &storage,
                sqlite(),
                CreateOptions {
                    connection: "default".into(),
                    ..CreateOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(snapshot.name.len(), "2024-01-01_00-00-00".len());
    }

    #[tokio::test]
    async fn test_failed_dump_leaves_nothing() {
        let storage = Storage::memory("snapshots");
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let factory = SnapshotFactory::new(events);

        let err = factory
            .create(&storage, Arc::new(FailingDriver), options("broken"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DumpFailed { .. }), "{err}");
        assert!(err.to_string().contains("connection reset"));
        assert!(storage.all_files().await.unwrap().is_empty());

        let first = rx.try_recv().unwrap();
        assert!(matches!(first, SnapshotEvent::Creating { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_name_rejected_before_events() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let err = SnapshotFactory::new(events)
            .create(&Storage::memory("s"), sqlite(), options("../escape"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_staging_directory_is_cleaned_up() {
        let tmp = tempfile::TempDir::new().unwrap();
        let factory = SnapshotFactory::default().with_temporary_directory(tmp.path());
        factory
            .create(&Storage::memory("s"), sqlite(), options("clean"))
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_upload_reports_storage_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let factory = SnapshotFactory::new(events).with_temporary_directory(tmp.path());
        let storage = Storage::custom("readonly", ReadOnlyDisk);

        let err = factory
            .create(&storage, sqlite(), options("nightly"))
            .await
            .unwrap_err();

        match &err {
            Error::StorageWriteFailed { path, reason } => {
                assert_eq!(path, "nightly.sql");
                assert!(reason.contains("bucket is read-only"));
            },
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(rx.try_recv().unwrap(), SnapshotEvent::Creating { .. }));
        assert!(rx.try_recv().is_err());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
