//! Snapshot descriptor and file naming rules.

use crate::disk::FileMeta;
use crate::error::{Error, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Extension of a plain SQL snapshot.
pub const SQL_EXTENSION: &str = "sql";

/// Extension added to gzip-compressed snapshots.
pub const GZIP_EXTENSION: &str = "gz";

/// Format of generated snapshot names.
pub const DEFAULT_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A database dump stored on a disk.
///
/// Built from the disk's listing; nothing beyond the file itself is
/// persisted. Deleting a snapshot consumes the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Path of the file on the disk (e.g. "nightly.sql.gz").
    pub file_name: String,
    /// File name without directory and the `.sql` / `.sql.gz` suffix.
    pub name: String,
    /// Name of the disk holding the file.
    pub disk: String,
    /// Stored size in bytes.
    pub size: u64,
    /// Last-modified time reported by the disk.
    pub created_at: DateTime<Utc>,
    /// Whether the file is gzip-compressed.
    pub compressed: bool,
}

impl Snapshot {
    /// Builds a descriptor from disk metadata.
    ///
    /// Returns `None` when the file does not follow the snapshot naming
    /// convention.
    pub fn from_file(disk: &str, meta: &FileMeta) -> Option<Self> {
        let (name, compressed) = parse_file_name(&meta.path)?;
        Some(Self {
            file_name: meta.path.clone(),
            name,
            disk: disk.to_string(),
            size: meta.size,
            created_at: meta.last_modified,
            compressed,
        })
    }

    /// Whether `query` names this snapshot, by name or by file name.
    pub fn matches(&self, query: &str) -> bool {
        self.name == query || self.file_name == query
    }
}

/// Splits a snapshot file name into `(name, compressed)`.
///
/// Accepts `<name>.sql` and `<name>.sql.gz`; anything else is `None`.
///
/// # Example
///
/// ```
/// use dbsnap::snapshot::parse_file_name;
///
/// assert_eq!(parse_file_name("dumps/a.sql.gz"), Some(("a".to_string(), true)));
/// assert_eq!(parse_file_name("otherfile.txt"), None);
/// ```
pub fn parse_file_name(path: &str) -> Option<(String, bool)> {
    let base = path.rsplit('/').next().unwrap_or(path);
    let (stem, compressed) = match base.strip_suffix(&format!(".{GZIP_EXTENSION}")) {
        Some(stem) => (stem, true),
        None => (base, false),
    };
    let name = stem.strip_suffix(&format!(".{SQL_EXTENSION}"))?;
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), compressed))
}

/// File name a snapshot called `name` is stored under.
pub fn file_name_for(name: &str, compressed: bool) -> String {
    if compressed {
        format!("{name}.{SQL_EXTENSION}.{GZIP_EXTENSION}")
    } else {
        format!("{name}.{SQL_EXTENSION}")
    }
}

/// Checks that a name can be used for a new snapshot.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] for empty names, path separators, `..`
/// or a leading dot.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("name cannot be empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("name cannot contain path separators")
    } else if name.contains("..") {
        Some("name cannot contain '..'")
    } else if name.starts_with('.') {
        Some("name cannot start with '.'")
    } else if name.chars().any(char::is_control) {
        Some("name cannot contain control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::invalid_name(name, reason)),
        None => Ok(()),
    }
}

/// Name used when a snapshot is created without one.
pub fn default_name(now: DateTime<Local>) -> String {
    now.format(DEFAULT_NAME_FORMAT).to_string()
}
