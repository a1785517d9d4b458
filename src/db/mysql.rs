//! MySQL / MariaDB driver using the `mysqldump` and `mysql` clients.

use super::backend::DatabaseDriver;
use super::process::ClientCommand;
use super::types::{DumpOptions, LoadMode, ServerSettings};
use anyhow::Result;
use std::io::BufRead;
use std::path::Path;

/// MySQL driver.
pub struct MySqlDriver {
    settings: ServerSettings,
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

impl MySqlDriver {
    pub fn new(settings: ServerSettings) -> Self {
        Self { settings }
    }

    fn client(&self, name: &str) -> ClientCommand {
        let s = &self.settings;
        let mut cmd = ClientCommand::new(s.binary_dir.as_deref(), name);
        if let Some(user) = &s.username {
            cmd = cmd.arg(format!("--user={user}"));
        }
        if let Some(socket) = &s.socket {
            cmd = cmd.arg(format!("--socket={socket}"));
        } else {
            if let Some(host) = &s.host {
                cmd = cmd.arg(format!("--host={host}"));
            }
            if let Some(port) = s.port {
                cmd = cmd.arg(format!("--port={port}"));
            }
        }
        if let Some(password) = &s.password {
            cmd = cmd.env("MYSQL_PWD", password);
        }
        cmd
    }

    pub(crate) fn dump_command(&self, dest: &Path, options: &DumpOptions) -> ClientCommand {
        let database = &self.settings.database;
        let mut cmd = self
            .client("mysqldump")
            .args(["--skip-comments", "--extended-insert"])
            .arg(format!("--result-file={}", dest.display()))
            .args(options.extra_options.iter().cloned());
        for table in &options.exclude {
            cmd = cmd.arg(format!("--ignore-table={database}.{table}"));
        }
        cmd = cmd.arg(database.clone());
        if let Some(tables) = &options.tables {
            cmd = cmd.args(tables.iter().cloned());
        }
        cmd
    }

    pub(crate) fn client_command(&self) -> ClientCommand {
        self.client("mysql").arg(self.settings.database.clone())
    }

    /// `(name, type)` pairs from `SHOW FULL TABLES`.
    fn objects(&self) -> Result<Vec<(String, String)>> {
        let output = self
            .client("mysql")
            .args(["--batch", "--skip-column-names", "--execute=SHOW FULL TABLES"])
            .arg(self.settings.database.clone())
            .output()?;
        Ok(output
            .lines()
            .filter_map(|line| {
                let mut fields = line.split('\t');
                let name = fields.next()?.trim();
                let kind = fields.next().unwrap_or("BASE TABLE").trim();
                (!name.is_empty()).then(|| (name.to_string(), kind.to_string()))
            })
            .collect())
    }
}

pub(crate) fn drop_statement(objects: &[(String, String)]) -> Option<String> {
    if objects.is_empty() {
        return None;
    }
    let mut sql = String::from("SET FOREIGN_KEY_CHECKS=0;\n");
    for (name, kind) in objects {
        let keyword = if kind == "VIEW" { "VIEW" } else { "TABLE" };
        sql.push_str(&format!("DROP {keyword} IF EXISTS {};\n", quote_ident(name)));
    }
    sql.push_str("SET FOREIGN_KEY_CHECKS=1;\n");
    Some(sql)
}

impl DatabaseDriver for MySqlDriver {
    fn driver_name(&self) -> &'static str {
        "mysql"
    }

    fn dump(&self, dest: &Path, options: &DumpOptions) -> Result<()> {
        self.dump_command(dest, options).run()
    }

    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self
            .objects()?
            .into_iter()
            .filter(|(_, kind)| kind != "VIEW")
            .map(|(name, _)| name)
            .collect())
    }

    fn drop_all_tables(&self) -> Result<()> {
        match drop_statement(&self.objects()?) {
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
