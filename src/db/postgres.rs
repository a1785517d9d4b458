//! PostgreSQL driver using the `pg_dump` and `psql` clients.

use super::backend::DatabaseDriver;
use super::process::ClientCommand;
use super::types::{DumpOptions, LoadMode, ServerSettings, quote_ident};
use anyhow::Result;
use std::io::BufRead;
use std::path::Path;

const LIST_TABLES: &str =
    "SELECT tablename FROM pg_tables WHERE schemaname = current_schema() ORDER BY tablename";
const LIST_VIEWS: &str =
    "SELECT viewname FROM pg_views WHERE schemaname = current_schema() ORDER BY viewname";

/// PostgreSQL driver.
pub struct PostgresDriver {
    settings: ServerSettings,
}

impl PostgresDriver {
    pub fn new(settings: ServerSettings) -> Self {
        Self { settings }
    }

    fn client(&self, name: &str) -> ClientCommand {
        let s = &self.settings;
        let mut cmd = ClientCommand::new(s.binary_dir.as_deref(), name);
        // A unix socket directory is passed to libpq as the host.
        if let Some(host) = s.socket.as_ref().or(s.host.as_ref()) {
            cmd = cmd.arg(format!("--host={host}"));
        }
        if let Some(port) = s.port {
            cmd = cmd.arg(format!("--port={port}"));
        }
        if let Some(user) = &s.username {
            cmd = cmd.arg(format!("--username={user}"));
        }
        if let Some(password) = &s.password {
            cmd = cmd.env("PGPASSWORD", password);
        }
        cmd.arg("--no-password")
    }

    pub(crate) fn dump_command(&self, dest: &Path, options: &DumpOptions) -> ClientCommand {
        let mut cmd = self
            .client("pg_dump")
            .arg(format!("--dbname={}", self.settings.database))
            .arg(format!("--file={}", dest.display()));
        if let Some(tables) = &options.tables {
            for table in tables {
                cmd = cmd.arg(format!("--table={table}"));
            }
        }
        for table in &options.exclude {
            cmd = cmd.arg(format!("--exclude-table={table}"));
        }
        cmd.args(options.extra_options.iter().cloned())
    }

    pub(crate) fn client_command(&self) -> ClientCommand {
        self.client("psql")
            .arg(format!("--dbname={}", self.settings.database))
            .args(["--quiet", "--no-psqlrc", "--set=ON_ERROR_STOP=1"])
    }

    fn query_names(&self, sql: &str) -> Result<Vec<String>> {
        let output = self
            .client_command()
            .args(["--tuples-only", "--no-align"])
            .arg(format!("--command={sql}"))
            .output()?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

pub(crate) fn drop_statement(views: &[String], tables: &[String]) -> Option<String> {
    let mut sql = String::new();
    if !views.is_empty() {
        let names: Vec<String> = views.iter().map(|v| quote_ident(v)).collect();
        sql.push_str(&format!("DROP VIEW IF EXISTS {} CASCADE;\n", names.join(", ")));
    }
    if !tables.is_empty() {
        let names: Vec<String> = tables.iter().map(|t| quote_ident(t)).collect();
        sql.push_str(&format!("DROP TABLE IF EXISTS {} CASCADE;\n", names.join(", ")));
    }
    (!sql.is_empty()).then_some(sql)
}

impl DatabaseDriver for PostgresDriver {
    fn driver_name(&self) -> &'static str {
        "pgsql"
    }

    fn dump(&self, dest: &Path, options: &DumpOptions) -> Result<()> {
        self.dump_command(dest, options).run()
    }

    fn table_names(&self) -> Result<Vec<String>> {
        self.query_names(LIST_TABLES)
    }

    fn drop_all_tables(&self) -> Result<()> {
        let views = self.query_names(LIST_VIEWS)?;
        let tables = self.table_names()?;
        match drop_statement(&views, &tables) {
            Some(sql) => self.execute(&sql),
            None => Ok(()),
        }
    }

    fn execute(&self, sql: &str) -> Result<()> {
        let mut input = sql.as_bytes();
        self.client_command().run_with_stdin(&mut input)
    }

    fn restore(&self, script: &mut dyn BufRead, _mode: LoadMode) -> Result<()> {
        let mut script = script;
        self.client_command().run_with_stdin(&mut script)
    }
}
