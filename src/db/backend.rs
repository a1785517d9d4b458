//! Driver trait for database connections.
//!
//! A driver turns a database into a SQL script and back. All methods block;
//! the snapshot engine calls them from `tokio::task::spawn_blocking`.

use super::statements::Statements;
use super::types::{DumpOptions, LoadMode};
use anyhow::{Context, Result};
use std::io::{BufRead, Read};
use std::path::Path;

/// Backend trait for database dump and restore.
///
/// Implementations must be thread-safe (`Send + Sync`) so a driver can be
/// shared through an `Arc` and moved onto the blocking pool.
///
/// # Example
///
/// ```ignore
/// use dbsnap::db::{DatabaseDriver, DumpOptions, SqliteDriver};
///
/// let driver = SqliteDriver::open("database.sqlite")?;
/// driver.dump(Path::new("/tmp/dump.sql"), &DumpOptions::default())?;
/// ```
pub trait DatabaseDriver: Send + Sync + 'static {
    /// Driver identifier as used in configuration (`sqlite`, `mysql`, `pgsql`).
    fn driver_name(&self) -> &'static str;

    /// Writes a SQL dump of the database to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dump cannot be produced or written.
    fn dump(&self, dest: &Path, options: &DumpOptions) -> Result<()>;

    /// Names of the user tables in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be queried.
    fn table_names(&self) -> Result<Vec<String>>;

    /// Drops every user table and view.
    ///
    /// # Errors
    ///
    /// Returns an error if any drop fails.
    fn drop_all_tables(&self) -> Result<()>;

    /// Executes one or more SQL statements without parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    fn execute(&self, sql: &str) -> Result<()>;

    /// Applies a SQL script to the database.
    ///
    /// The default reads the whole script for [`LoadMode::Buffered`], and
    /// executes one statement at a time for [`LoadMode::Streaming`].
    ///
    /// # Errors
    ///
    /// Returns an error if reading the script or executing it fails.
    fn restore(&self, script: &mut dyn BufRead, mode: LoadMode) -> Result<()> {
        match mode {
            LoadMode::Buffered => {
                let mut sql = String::new();
                script
                    .read_to_string(&mut sql)
                    .context("Failed to read snapshot script")?;
                if sql.trim().is_empty() {
                    return Ok(());
                }
                self.execute(&sql)
            },
            LoadMode::Streaming => {
                let mut count = 0usize;
                for statement in Statements::new(script) {
                    let statement = statement.context("Failed to read snapshot script")?;
                    self.execute(&statement)
                        .with_context(|| format!("Statement #{} failed", count + 1))?;
                    count += 1;
                }
                tracing::debug!(statements = count, "Streamed snapshot into database");
                Ok(())
            },
        }
    }
}
