//! Types shared by all disk backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a file stored on a disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMeta {
    /// Path of the file relative to the disk root (e.g. "nightly.sql.gz")
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time as reported by the backend
    pub last_modified: DateTime<Utc>,
}
