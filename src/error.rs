//! Error types for snapshot operations.
//!
//! Backends and drivers report failures through `anyhow`; the snapshot engine
//! maps them into these variants at the seam so callers can match on what
//! went wrong (dump, storage, missing snapshot, restore).

use std::path::PathBuf;

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Snapshot errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The database driver failed to produce a dump.
    #[error("failed to dump connection '{connection}': {reason}")]
    DumpFailed { connection: String, reason: String },

    /// The storage backend rejected a write.
    #[error("failed to write '{path}' to storage: {reason}")]
    StorageWriteFailed { path: String, reason: String },

    /// Any other storage backend failure (list, read, delete).
    #[error("storage error while {context}: {reason}")]
    Storage { context: String, reason: String },

    /// No snapshot with this name exists on the disk.
    #[error("snapshot `{name}` does not exist")]
    SnapshotNotFound { name: String },

    /// The driver failed while loading a snapshot.
    #[error("failed to load snapshot `{name}`: {reason}")]
    RestoreFailed { name: String, reason: String },

    /// Snapshot name rejected before anything was written.
    #[error("invalid snapshot name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    /// Conflicting or unusable options.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The requested disk has no configuration entry.
    #[error("cannot create a disk `{name}`: there is no disk set up with that name")]
    DiskNotConfigured { name: String },

    /// The disk is configured with a driver this build does not provide.
    #[error("cannot create disk `{name}`: unsupported driver `{driver}` (use `local` or `memory`)")]
    UnsupportedDisk { name: String, driver: String },

    /// The requested connection has no configuration entry.
    #[error("connection `{name}` is not configured")]
    ConnectionNotConfigured { name: String },

    /// No dumper exists for the connection's driver.
    #[error("cannot create a dumper for db driver `{driver}`: use `mysql`, `pgsql` or `sqlite`")]
    UnsupportedDriver { driver: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error with context.
    #[error("IO error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Temporary staging path could not be prepared.
    #[error("cannot use temporary directory {path:?}: {source}")]
    TempDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a dump failure from any driver error.
    pub fn dump_failed(connection: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::DumpFailed {
            connection: connection.into(),
            reason: format!("{err:#}"),
        }
    }

    /// Create a storage write failure from a backend error.
    pub fn storage_write_failed(path: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::StorageWriteFailed {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }

    /// Create a generic storage failure from a backend error.
    pub fn storage(context: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Storage {
            context: context.into(),
            reason: format!("{err:#}"),
        }
    }

    /// Create a restore failure from a driver error.
    pub fn restore_failed(name: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::RestoreFailed {
            name: name.into(),
            reason: format!("{err:#}"),
        }
    }

    /// Create a snapshot-not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::SnapshotNotFound { name: name.into() }
    }

    /// Create an invalid-name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the target snapshot is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SnapshotNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = Error::dump_failed("main", &anyhow::anyhow!("mysqldump exited with 2"));
        assert_eq!(
            err.to_string(),
            "failed to dump connection 'main': mysqldump exited with 2"
        );

        let err = Error::not_found("nightly");
        assert_eq!(err.to_string(), "snapshot `nightly` does not exist");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_reason_keeps_anyhow_chain() {
        let inner = anyhow::anyhow!("disk full").context("Failed to write object: a.sql");
        let err = Error::storage_write_failed("a.sql", &inner);
        let msg = err.to_string();
        assert!(msg.contains("Failed to write object: a.sql"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_unsupported_driver_lists_choices() {
        let err = Error::UnsupportedDriver {
            driver: "oracle".into(),
        };
        assert!(err.to_string().contains("`mysql`, `pgsql` or `sqlite`"));
    }
}
