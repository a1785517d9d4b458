//! Shared defaults.

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dbsnap.toml";

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "DBSNAP_CONFIG";

/// Disk used when neither the config nor `--disk` names one.
pub const DEFAULT_DISK: &str = "snapshots";

/// Root of the built-in default disk, relative to the config directory.
pub const DEFAULT_DISK_ROOT: &str = "snapshots";

/// Connection used when neither the config nor `--connection` names one.
pub const DEFAULT_CONNECTION: &str = "default";

/// Disk drivers this build provides.
pub const DISK_DRIVERS: &[&str] = &["local", "memory"];

/// Database drivers this build provides.
pub const DB_DRIVERS: &[&str] = &["mysql", "pgsql", "sqlite"];

/// SQLite database name that never touches the filesystem.
pub const SQLITE_MEMORY: &str = ":memory:";
