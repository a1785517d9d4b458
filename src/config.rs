//! Configuration for dbsnap.
//!
//! Loaded from `dbsnap.toml`:
//!
//! - [`Config`] - Root configuration struct
//! - [`SnapshotSettings`] - Defaults for new snapshots (`[snapshots]`)
//! - [`DiskConfig`] - Named storage disks (`[disks.<name>]`)
//! - [`ConnectionConfig`] - Named database connections (`[connections.<name>]`)
//!
//! Relative paths in the file are resolved against the file's directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// dbsnap.toml configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub snapshots: SnapshotSettings,
    #[serde(default = "default_disks")]
    pub disks: BTreeMap<String, DiskConfig>,
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

/// Defaults applied to every snapshot command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// Disk snapshots are stored on.
    #[serde(default = "default_disk")]
    pub disk: String,
    /// Connection dumped and loaded when `--connection` is not given.
    #[serde(default)]
    pub default_connection: Option<String>,
    /// Where dumps are staged before upload.
    #[serde(default)]
    pub temporary_directory: Option<PathBuf>,
    /// Gzip new snapshots.
    #[serde(default)]
    pub compress: bool,
    /// Only dump these tables.
    #[serde(default)]
    pub tables: Option<Vec<String>>,
    /// Never dump these tables.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Extra arguments for `mysqldump` / `pg_dump`.
    #[serde(default)]
    pub extra_options: Vec<String>,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            disk: default_disk(),
            default_connection: None,
            temporary_directory: None,
            compress: false,
            tables: None,
            exclude: Vec::new(),
            extra_options: Vec::new(),
        }
    }
}

/// A named storage disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiskConfig {
    /// `local` or `memory`.
    #[serde(default = "default_disk_driver")]
    pub driver: String,
    /// Directory for `local` disks.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// A named database connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// `sqlite`, `mysql` or `pgsql`.
    pub driver: String,
    /// Database name, or file path for SQLite.
    pub database: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub socket: Option<String>,
    /// Directory holding `mysqldump` / `pg_dump`; `PATH` when unset.
    #[serde(default)]
    pub dump_binary_path: Option<PathBuf>,
}

fn default_disk() -> String {
    constants::DEFAULT_DISK.to_string()
}

fn default_disk_driver() -> String {
    "local".to_string()
}

fn default_disks() -> BTreeMap<String, DiskConfig> {
    let mut disks = BTreeMap::new();
    disks.insert(
        constants::DEFAULT_DISK.to_string(),
        DiskConfig {
            driver: default_disk_driver(),
            root: Some(PathBuf::from(constants::DEFAULT_DISK_ROOT)),
        },
    );
    disks
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshots: SnapshotSettings::default(),
            disks: default_disks(),
            connections: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from dbsnap.toml in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if dbsnap.toml cannot be read or contains invalid TOML.
    pub fn load() -> Result<Self> {
        Self::load_from(constants::DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Required fields are missing or have invalid types
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load the given file, or `dbsnap.toml` if present, or built-in defaults.
    ///
    /// An explicitly given file must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let default = Path::new(constants::DEFAULT_CONFIG_FILE);
        if default.exists() {
            Self::load_from(default)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text. Paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Makes relative paths absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        if let Some(dir) = self.snapshots.temporary_directory.as_mut() {
            resolve(dir);
        }
        for disk in self.disks.values_mut() {
            if let Some(root) = disk.root.as_mut() {
                resolve(root);
            }
        }
        for connection in self.connections.values_mut() {
            if let Some(dir) = connection.dump_binary_path.as_mut() {
                resolve(dir);
            }
            if connection.driver == "sqlite" && connection.database != constants::SQLITE_MEMORY {
                let mut database = PathBuf::from(&connection.database);
                resolve(&mut database);
                connection.database = database.display().to_string();
            }
        }
    }

    /// Connection used when none is given on the command line.
    pub fn default_connection(&self) -> &str {
        self.snapshots
            .default_connection
            .as_deref()
            .unwrap_or(constants::DEFAULT_CONNECTION)
    }

    /// Validate configuration with comprehensive checks.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails with one or more errors:
    /// - Unknown disk or database drivers
    /// - Local disks without a root, connections without a database
    /// - Both `tables` and `exclude` set
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Snapshot defaults
        let settings = &self.snapshots;
        if settings.tables.as_ref().is_some_and(|t| !t.is_empty()) && !settings.exclude.is_empty() {
            errors.push("snapshots.tables and snapshots.exclude cannot both be set".to_string());
        }
        if !self.disks.contains_key(&settings.disk) {
            warnings.push(format!(
                "Default disk '{}' is not configured\n  \
                 Add a [disks.{}] section or pass --disk",
                settings.disk, settings.disk
            ));
        }
        if !self.connections.is_empty() && !self.connections.contains_key(self.default_connection()) {
            warnings.push(format!(
                "Default connection '{}' is not configured\n  \
                 Set snapshots.default_connection or pass --connection",
                self.default_connection()
            ));
        }
        if let Some(dir) = &settings.temporary_directory
            && !dir.exists()
        {
            warnings.push(format!(
                "Temporary directory does not exist and will be created: {}",
                dir.display()
            ));
        }

        // 2. Disks
        for (name, disk) in &self.disks {
            if !constants::DISK_DRIVERS.contains(&disk.driver.as_str()) {
                errors.push(format!(
                    "Disk '{name}' uses unsupported driver '{}'. Valid drivers: {}",
                    disk.driver,
                    constants::DISK_DRIVERS.join(", ")
                ));
            } else if disk.driver == "local" && disk.root.is_none() {
                errors.push(format!("Disk '{name}' is a local disk without a root"));
            }
        }

        // 3. Connections
        for (name, connection) in &self.connections {
            if !constants::DB_DRIVERS.contains(&connection.driver.as_str()) {
                errors.push(format!(
                    "Connection '{name}' uses unsupported driver '{}'. Valid drivers: {}",
                    connection.driver,
                    constants::DB_DRIVERS.join(", ")
                ));
                continue;
            }
            if connection.database.trim().is_empty() {
                errors.push(format!("Connection '{name}' has an empty database"));
            }
            if connection.port == Some(0) {
                errors.push(format!("Connection '{name}' port cannot be 0"));
            }
            if connection.driver == "sqlite" {
                if connection.host.is_some() || connection.port.is_some() {
                    warnings.push(format!(
                        "Connection '{name}' is sqlite; host and port are ignored"
                    ));
                }
                if !settings.extra_options.is_empty() {
                    warnings.push(format!(
                        "Connection '{name}' is sqlite; snapshots.extra_options are ignored"
                    ));
                }
            }
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[snapshots]
disk = "backups"
default_connection = "main"
compress = true
exclude = ["sessions"]

[disks.backups]
driver = "local"
root = "storage/backups"

[disks.scratch]
driver = "memory"

[connections.main]
driver = "sqlite"
database = "database.sqlite"

[connections.shop]
driver = "mysql"
database = "shop"
host = "127.0.0.1"
port = 3306
username = "root"
dump_binary_path = "/usr/local/mysql/bin"
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.snapshots.disk, "snapshots");
        assert!(!config.snapshots.compress);
        assert_eq!(config.default_connection(), "default");
        assert!(config.disks.contains_key("snapshots"));
        assert!(config.connections.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(FULL).unwrap();
        assert_eq!(config.snapshots.disk, "backups");
        assert_eq!(config.default_connection(), "main");
        assert!(config.snapshots.compress);
        assert_eq!(config.snapshots.exclude, vec!["sessions"]);
        assert_eq!(config.disks.len(), 2);
        assert_eq!(config.disks["scratch"].driver, "memory");
        assert_eq!(config.connections["shop"].port, Some(3306));
        assert!(config.validate().unwrap().warnings.is_empty());
    }

    #[test]
    fn test_load_from_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbsnap.toml");
        fs::write(&path, FULL).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.disks["backups"].root.as_deref(),
            Some(dir.path().join("storage/backups").as_path())
        );
        assert_eq!(
            config.connections["main"].database,
            dir.path().join("database.sqlite").display().to_string()
        );
        assert_eq!(
            config.connections["shop"].dump_binary_path.as_deref(),
            Some(Path::new("/usr/local/mysql/bin"))
        );
        assert_eq!(config.connections["shop"].database, "shop");
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from("/nonexistent/dbsnap.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_validate_unknown_drivers() {
        let config = Config::from_toml_str(
            r#"
[disks.cloud]
driver = "s3"

[connections.main]
driver = "oracle"
database = "x"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("unsupported driver 's3'"));
        assert!(err.contains("unsupported driver 'oracle'"));
    }

    #[test]
    fn test_validate_tables_and_exclude() {
        let config = Config::from_toml_str(
            r#"
[snapshots]
tables = ["users"]
exclude = ["posts"]
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("cannot both be set"));
    }

    #[test]
    fn test_validate_warnings() {
        let config = Config::from_toml_str(
            r#"
[snapshots]
disk = "missing"

[connections.other]
driver = "sqlite"
database = ":memory:"
host = "localhost"
"#,
        )
        .unwrap();
        let result = config.validate().unwrap();
        assert!(result.has_warnings());
        assert!(result.warnings.iter().any(|w| w.contains("'missing'")));
        assert!(result.warnings.iter().any(|w| w.contains("'default'")));
        assert!(result.warnings.iter().any(|w| w.contains("host and port are ignored")));
    }

    #[test]
    fn test_memory_sqlite_path_not_resolved() {
        let mut config = Config::from_toml_str(
            r#"
[connections.default]
driver = "sqlite"
database = ":memory:"
"#,
        )
        .unwrap();
        config.resolve_paths(Path::new("/srv/app"));
        assert_eq!(config.connections["default"].database, ":memory:");
    }
}
