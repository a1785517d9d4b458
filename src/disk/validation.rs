//! File path rules shared by the disk backends.
//!
//! Paths are `/`-separated keys relative to the disk root. A key can never
//! leave the root, and names under [`RESERVED_PREFIX`] belong to the backends
//! themselves (in-flight uploads), so callers cannot create or read them.

use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};

/// Leading characters of file names the backends keep for their own use.
pub(crate) const RESERVED_PREFIX: &str = ".dbsnap-";

/// Splits a file path into its segments.
///
/// `.` and empty segments are dropped and `\` counts as a separator. Fails
/// for empty or absolute paths, `..`, control characters, drive prefixes and
/// reserved names.
fn segments(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        bail!("File path cannot be empty");
    }
    if path.starts_with(['/', '\\']) || Path::new(path).is_absolute() {
        bail!("File path must be relative to the disk root: {path}");
    }
    if path.chars().any(char::is_control) {
        bail!("File path cannot contain control characters: {path:?}");
    }

    let mut parts = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {},
            ".." => bail!("File path cannot leave the disk root: {path}"),
            s if s.starts_with(RESERVED_PREFIX) => {
                bail!("File name '{s}' is reserved for in-flight uploads")
            },
            s if !matches!(Path::new(s).components().next(), Some(Component::Normal(_))) => {
                bail!("File path cannot contain a drive or root: {path}")
            },
            s => parts.push(s),
        }
    }

    if parts.is_empty() {
        bail!("File path has no file name: {path}");
    }
    Ok(parts)
}

/// Storage key for a file path: its segments joined with `/`.
pub(crate) fn normalized_key(path: &str) -> Result<String> {
    Ok(segments(path)?.join("/"))
}

/// Location of a file under a local disk root.
pub(crate) fn file_path(root: &Path, path: &str) -> Result<PathBuf> {
    Ok(segments(path)?
        .into_iter()
        .fold(root.to_path_buf(), |dir, segment| dir.join(segment)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_separators_and_current_dir() {
        assert_eq!(normalized_key("./a/./b.sql").unwrap(), "a/b.sql");
        assert_eq!(normalized_key("a\\b.sql").unwrap(), "a/b.sql");
        assert_eq!(normalized_key("a//b.sql").unwrap(), "a/b.sql");
    }

    #[test]
    fn test_rejects_paths_outside_root() {
        let rejected = ["", ".", "./", "../x.sql", "a/../../x.sql", "/etc/passwd", "\\x.sql"];
        for path in rejected {
            assert!(normalized_key(path).is_err(), "accepted: {path:?}");
        }
    }

    #[test]
    fn test_rejects_control_characters() {
        let err = normalized_key("night\nly.sql").unwrap_err();
        assert!(err.to_string().contains("control characters"));
    }

    #[test]
    fn test_rejects_reserved_names() {
        let err = normalized_key("backups/.dbsnap-upload-x.sql").unwrap_err();
        assert!(err.to_string().contains("reserved"));
        assert!(normalized_key(".dbsnap.sql").is_ok());
    }

    #[test]
    fn test_file_path_joins_root() {
        let root = Path::new("/srv/snapshots");
        assert_eq!(
            file_path(root, "daily/nightly.sql").unwrap(),
            root.join("daily").join("nightly.sql")
        );
    }
}
