//! SQLite driver backed by rusqlite.
//!
//! Dumps are produced in-process in the same shape as the `sqlite3` shell's
//! `.dump`: schema, rows as `INSERT` statements, `sqlite_sequence`, then
//! indexes, triggers and views, all inside one transaction.

use super::backend::DatabaseDriver;
use super::types::{DumpOptions, Value, quote_ident, quote_literal};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// SQLite database driver.
///
/// Holds one connection behind a mutex; rusqlite connections are `Send` but
/// not `Sync`.
pub struct SqliteDriver {
    conn: Mutex<Connection>,
}

impl SqliteDriver {
    /// Opens (or creates) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened as a SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot allocate the database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs a closure with the underlying connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock();
        f(&conn)
    }
}

/// Schema objects of one kind, in creation order.
fn schema_entries(conn: &Connection, kinds: &str) -> Result<Vec<(String, String, String)>> {
    let sql = format!(
        "SELECT name, tbl_name, sql FROM sqlite_master \
         WHERE type IN ({kinds}) AND sql NOT NULL AND name NOT LIKE 'sqlite_%' \
         ORDER BY rowid"
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("Failed to read schema from sqlite_master")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .context("Failed to query sqlite_master")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read sqlite_master row")
}

fn write_rows(conn: &Connection, table: &str, out: &mut impl Write) -> Result<u64> {
    let sql = format!("SELECT * FROM {}", quote_ident(table));
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("Failed to prepare row scan for table: {table}"))?;
    let column_count = stmt.column_count();
    let mut rows = stmt
        .query([])
        .with_context(|| format!("Failed to scan table: {table}"))?;

    let insert_prefix = format!("INSERT INTO {} VALUES(", quote_ident(table));
    let mut count = 0u64;
    while let Some(row) = rows
        .next()
        .with_context(|| format!("Failed to read row from table: {table}"))?
    {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value = Value::from(row.get_ref(idx)?);
            values.push(value.to_sql_literal());
        }
        writeln!(out, "{insert_prefix}{});", values.join(","))?;
        count += 1;
    }
    Ok(count)
}

fn has_sqlite_sequence(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check for sqlite_sequence")?;
    Ok(count > 0)
}

fn write_sequences(conn: &Connection, options: &DumpOptions, out: &mut impl Write) -> Result<()> {
    if !has_sqlite_sequence(conn)? {
        return Ok(());
    }
    let mut stmt = conn
        .prepare("SELECT name, seq FROM sqlite_sequence ORDER BY name")
        .context("Failed to read sqlite_sequence")?;
    let sequences = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .context("Failed to query sqlite_sequence")?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let selected: Vec<_> = sequences
        .into_iter()
        .filter(|(name, _)| options.includes(name))
        .collect();
    if selected.is_empty() {
        return Ok(());
    }

    writeln!(out, "DELETE FROM sqlite_sequence;")?;
    for (name, seq) in selected {
        writeln!(
            out,
            "INSERT INTO sqlite_sequence VALUES({},{seq});",
            quote_literal(&name)
        )?;
    }
    Ok(())
}

impl DatabaseDriver for SqliteDriver {
    fn driver_name(&self) -> &'static str {
        "sqlite"
    }

    fn dump(&self, dest: &Path, options: &DumpOptions) -> Result<()> {
        let conn = self.conn.lock();
        let file = File::create(dest)
            .with_context(|| format!("Failed to create dump file: {}", dest.display()))?;
        let mut out = BufWriter::new(file);

        writeln!(out, "PRAGMA foreign_keys=OFF;")?;
        writeln!(out, "BEGIN TRANSACTION;")?;

        let mut tables = 0usize;
        let mut rows = 0u64;
        for (name, _, sql) in schema_entries(&conn, "'table'")? {
            if !options.includes(&name) {
                continue;
            }
            writeln!(out, "{sql};")?;
            rows += write_rows(&conn, &name, &mut out)?;
            tables += 1;
        }

        write_sequences(&conn, options, &mut out)?;

        for (_, table, sql) in schema_entries(&conn, "'index', 'trigger', 'view'")? {
            if options.includes(&table) {
                writeln!(out, "{sql};")?;
            }
        }

        writeln!(out, "COMMIT;")?;
        out.flush()
            .with_context(|| format!("Failed to flush dump file: {}", dest.display()))?;

        tracing::debug!(tables, rows, dest = %dest.display(), "SQLite dump written");
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .context("Failed to list tables")?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .context("Failed to list tables")?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    fn drop_all_tables(&self) -> Result<()> {
        let tables = self.table_names()?;
        let conn = self.conn.lock();

        let views: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type = 'view'")
                .context("Failed to list views")?;
            stmt.query_map([], |row| row.get(0))
                .context("Failed to list views")?
                .collect::<rusqlite::Result<Vec<String>>>()?
        };

        let foreign_keys: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .context("Failed to read foreign_keys pragma")?;

        let mut sql = String::from("PRAGMA foreign_keys = OFF;\n");
        for view in &views {
            sql.push_str(&format!("DROP VIEW IF EXISTS {};\n", quote_ident(view)));
        }
        for table in &tables {
            sql.push_str(&format!("DROP TABLE IF EXISTS {};\n", quote_ident(table)));
        }
        sql.push_str(&format!("PRAGMA foreign_keys = {foreign_keys};\n"));

        conn.execute_batch(&sql)
            .context("Failed to drop existing tables")?;
        tracing::debug!(tables = tables.len(), views = views.len(), "Dropped SQLite schema");
        Ok(())
    }

    fn execute(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(sql).context("Failed to execute SQL")
    }
}
