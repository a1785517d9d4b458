//! Database drivers for dumping and restoring snapshots.
//!
//! SQLite is handled in-process through rusqlite. MySQL and PostgreSQL go
//! through their client binaries (`mysqldump`/`mysql`, `pg_dump`/`psql`),
//! which must be installed on the host.
//!
//! # Example
//!
//! ```ignore
//! use dbsnap::db::{DatabaseDriver, DumpOptions, LoadMode, SqliteDriver};
//!
//! let driver = SqliteDriver::open("database.sqlite")?;
//! driver.dump(Path::new("dump.sql"), &DumpOptions::default())?;
//! driver.drop_all_tables()?;
//! driver.restore(&mut BufReader::new(File::open("dump.sql")?), LoadMode::Streaming)?;
//! ```

mod backend;
mod mysql;
mod postgres;
mod process;
mod sqlite;
mod statements;
mod types;

pub use backend::DatabaseDriver;
pub use mysql::MySqlDriver;
pub use postgres::PostgresDriver;
pub use sqlite::SqliteDriver;
pub use statements::Statements;
pub use types::{DumpOptions, LoadMode, ServerSettings, Value};
