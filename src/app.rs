//! Resolves configured disks and connections into live handles.

use crate::config::{Config, ConnectionConfig};
use crate::db::{
    DatabaseDriver, DumpOptions, MySqlDriver, PostgresDriver, ServerSettings, SqliteDriver,
};
use crate::disk::Storage;
use crate::error::{Error, Result};
use crate::snapshot::{
    CreateOptions, EventBus, SnapshotFactory, SnapshotLoader, SnapshotRepository,
};
use dashmap::DashMap;
use std::sync::Arc;

/// Configuration plus the event bus shared by every snapshot operation.
///
/// Disks are opened once and cached, so memory disks keep their contents
/// for the lifetime of the `App`.
#[derive(Debug, Clone)]
pub struct App {
    config: Arc<Config>,
    events: EventBus,
    disks: Arc<DashMap<String, Storage>>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            events: EventBus::default(),
            disks: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Disk name to use when none is given.
    pub fn default_disk(&self) -> &str {
        &self.config.snapshots.disk
    }

    /// Opens the named disk, or the default disk.
    ///
    /// # Errors
    ///
    /// - [`Error::DiskNotConfigured`] if the disk has no config entry
    /// - [`Error::UnsupportedDisk`] for unknown drivers
    /// - [`Error::Config`] / [`Error::Storage`] if a local disk cannot be opened
    pub fn storage(&self, disk: Option<&str>) -> Result<Storage> {
        let name = disk.unwrap_or_else(|| self.default_disk());
        if let Some(storage) = self.disks.get(name) {
            return Ok(storage.clone());
        }

        let config = self
            .config
            .disks
            .get(name)
            .ok_or_else(|| Error::DiskNotConfigured {
                name: name.to_string(),
            })?;

        let storage = match config.driver.as_str() {
            "local" => {
                let root = config
                    .root
                    .as_ref()
                    .ok_or_else(|| Error::Config(format!("disk '{name}' has no root")))?;
                Storage::local(name, root)
                    .map_err(|e| Error::storage(format!("opening disk '{name}'"), &e))?
            },
            "memory" => Storage::memory(name),
            other => {
                return Err(Error::UnsupportedDisk {
                    name: name.to_string(),
                    driver: other.to_string(),
                });
            },
        };

        tracing::debug!(disk = name, driver = %config.driver, "Opened disk");
        self.disks.insert(name.to_string(), storage.clone());
        Ok(storage)
    }

    /// Name of the connection to use when none is given.
    pub fn connection_name<'a>(&'a self, connection: Option<&'a str>) -> &'a str {
        connection.unwrap_or_else(|| self.config.default_connection())
    }

    /// Builds a driver for the named connection, or the default connection.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionNotConfigured`] if the connection has no config entry
    /// - [`Error::UnsupportedDriver`] for drivers other than mysql, pgsql, sqlite
    /// - [`Error::Config`] if a SQLite database cannot be opened
    pub fn driver(&self, connection: Option<&str>) -> Result<Arc<dyn DatabaseDriver>> {
        let name = self.connection_name(connection);
        let config = self
            .config
            .connections
            .get(name)
            .ok_or_else(|| Error::ConnectionNotConfigured {
                name: name.to_string(),
            })?;
        build_driver(config)
    }

    /// Dump options from the `[snapshots]` defaults, overridden by non-empty
    /// command-line lists.
    pub fn dump_options(&self, tables: Vec<String>, exclude: Vec<String>) -> DumpOptions {
        let settings = &self.config.snapshots;
        DumpOptions {
            tables: if tables.is_empty() {
                settings.tables.clone()
            } else {
                Some(tables)
            },
            exclude: if exclude.is_empty() {
                settings.exclude.clone()
            } else {
                exclude
            },
            extra_options: settings.extra_options.clone(),
        }
    }

    /// Create options for a connection, using the configured defaults.
    pub fn create_options(&self, name: Option<String>, connection: &str) -> CreateOptions {
        CreateOptions {
            name,
            connection: connection.to_string(),
            compress: self.config.snapshots.compress,
            dump: self.dump_options(Vec::new(), Vec::new()),
        }
    }

    pub fn factory(&self) -> SnapshotFactory {
        let factory = SnapshotFactory::new(self.events.clone());
        match &self.config.snapshots.temporary_directory {
            Some(dir) => factory.with_temporary_directory(dir),
            None => factory,
        }
    }

    pub fn loader(&self) -> SnapshotLoader {
        let loader = SnapshotLoader::new(self.events.clone());
        match &self.config.snapshots.temporary_directory {
            Some(dir) => loader.with_temporary_directory(dir),
            None => loader,
        }
    }

    /// Snapshots on the named disk, or the default disk.
    ///
    /// # Errors
    ///
    /// Same as [`App::storage`].
    pub fn repository(&self, disk: Option<&str>) -> Result<SnapshotRepository> {
        Ok(SnapshotRepository::new(self.storage(disk)?, self.events.clone()))
    }
}

fn server_settings(config: &ConnectionConfig) -> ServerSettings {
    ServerSettings {
        host: config.host.clone(),
        port: config.port,
        database: config.database.clone(),
        username: config.username.clone(),
        password: config.password.clone(),
        socket: config.socket.clone(),
        binary_dir: config.dump_binary_path.clone(),
    }
}

/// Builds the driver a connection config asks for.
///
/// # Errors
///
/// Returns [`Error::UnsupportedDriver`] for unknown drivers and
/// [`Error::Config`] if a SQLite database cannot be opened.
pub fn build_driver(config: &ConnectionConfig) -> Result<Arc<dyn DatabaseDriver>> {
    match config.driver.as_str() {
        "sqlite" => {
            let driver = if config.database == crate::constants::SQLITE_MEMORY {
                SqliteDriver::in_memory()
            } else {
                SqliteDriver::open(&config.database)
            }
            .map_err(|e| Error::Config(format!("{e:#}")))?;
            Ok(Arc::new(driver))
        },
        "mysql" => Ok(Arc::new(MySqlDriver::new(server_settings(config)))),
        "pgsql" => Ok(Arc::new(PostgresDriver::new(server_settings(config)))),
        other => Err(Error::UnsupportedDriver {
            driver: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let config = Config::from_toml_str(
            r#"
[snapshots]
disk = "mem"
exclude = ["sessions"]

[disks.mem]
driver = "memory"

[disks.cloud]
driver = "s3"

[connections.default]
driver = "sqlite"
database = ":memory:"

[connections.legacy]
driver = "oracle"
database = "x"
"#,
        )
        .unwrap();
        App::new(config)
    }

    #[test]
    fn test_storage_resolution() {
        let app = app();
        assert_eq!(app.storage(None).unwrap().name(), "mem");
        assert!(matches!(
            app.storage(Some("nope")),
            Err(Error::DiskNotConfigured { .. })
        ));
        assert!(matches!(
            app.storage(Some("cloud")),
            Err(Error::UnsupportedDisk { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_disk_is_cached() {
        let app = app();
        app.storage(None).unwrap().put("a.sql", b"x").await.unwrap();
        assert!(app.storage(None).unwrap().exists("a.sql").await.unwrap());
    }

    #[test]
    fn test_driver_resolution() {
        let app = app();
        assert_eq!(app.driver(None).unwrap().driver_name(), "sqlite");
        let err = app.driver(Some("legacy")).err().unwrap();
        assert!(matches!(err, Error::UnsupportedDriver { .. }));
        assert!(err.to_string().contains("`mysql`, `pgsql` or `sqlite`"));
        assert!(matches!(
            app.driver(Some("missing")).err().unwrap(),
            Error::ConnectionNotConfigured { .. }
        ));
    }

    #[test]
    fn test_dump_options_override() {
        let app = app();
        let defaults = app.dump_options(Vec::new(), Vec::new());
        assert_eq!(defaults.exclude, vec!["sessions"]);
        assert!(defaults.tables.is_none());

        let cli = app.dump_options(vec!["users".into()], vec!["logs".into()]);
        assert_eq!(cli.tables, Some(vec!["users".to_string()]));
        assert_eq!(cli.exclude, vec!["logs"]);
    }
}
