//! Gzip helpers for snapshot files.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Compresses `source` into `dest`, returning the compressed size.
pub(crate) fn gzip_file(source: &Path, dest: &Path) -> Result<u64> {
    let mut input = BufReader::new(
        File::open(source)
            .with_context(|| format!("Failed to open dump for compression: {}", source.display()))?,
    );
    let output = File::create(dest)
        .with_context(|| format!("Failed to create compressed file: {}", dest.display()))?;
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(&mut input, &mut encoder)
        .with_context(|| format!("Failed to compress {}", source.display()))?;
    let mut writer = encoder.finish().context("Failed to finish gzip stream")?;
    writer.flush().context("Failed to flush compressed file")?;

    let size = std::fs::metadata(dest)
        .with_context(|| format!("Failed to stat compressed file: {}", dest.display()))?
        .len();
    Ok(size)
}

/// Decompresses `source` into `dest`.
pub(crate) fn gunzip_file(source: &Path, dest: &Path) -> Result<u64> {
    let mut reader = open_sql(source, true)?;
    let mut output = BufWriter::new(
        File::create(dest)
            .with_context(|| format!("Failed to create file: {}", dest.display()))?,
    );
    let written = io::copy(&mut reader, &mut output)
        .with_context(|| format!("Failed to decompress {}", source.display()))?;
    output.flush()?;
    Ok(written)
}

/// Opens a SQL file for reading, decoding gzip when `compressed`.
pub(crate) fn open_sql(path: &Path, compressed: bool) -> Result<Box<dyn BufRead + Send>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
    if compressed {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(BufReader::new(
            file,
        )))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Compresses an in-memory buffer.
pub fn gzip_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_gzip_then_gunzip_file() {
        let tmp = TempDir::new().unwrap();
        let plain = tmp.path().join("dump.sql");
        let packed = tmp.path().join("dump.sql.gz");
        let unpacked = tmp.path().join("copy.sql");
        let sql = "INSERT INTO models (name) VALUES ('x');\n".repeat(200);
        std::fs::write(&plain, &sql).unwrap();

        let size = gzip_file(&plain, &packed).unwrap();
        assert!(size > 0);
        assert!(size < sql.len() as u64);

        gunzip_file(&packed, &unpacked).unwrap();
        assert_eq!(std::fs::read_to_string(&unpacked).unwrap(), sql);
    }

    #[test]
    fn test_open_sql_decodes_gzip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.sql.gz");
        std::fs::write(&path, gzip_bytes(b"SELECT 1;\n").unwrap()).unwrap();

        let mut text = String::new();
        open_sql(&path, true)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "SELECT 1;\n");
    }

    #[test]
    fn test_open_sql_rejects_corrupt_gzip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.sql.gz");
        std::fs::write(&path, b"not gzip at all").unwrap();

        let mut text = String::new();
        assert!(
            open_sql(&path, true)
                .unwrap()
                .read_to_string(&mut text)
                .is_err()
        );
    }
}
