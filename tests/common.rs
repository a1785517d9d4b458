//! Shared test fixture.
//!
//! Every test gets its own temp directory holding:
//! - `database.sqlite` with empty `models`, `users` and `posts` tables
//! - `snapshotsDisk/`, a local disk with `snapshot1.sql` .. `snapshot3.sql`,
//!   then (at least one second later) `snapshot4.sql.gz` and `otherfile.txt`

#![allow(dead_code)]

use clap::Parser;
use dbsnap::cli::Cli;
use dbsnap::commands::{self, Console};
use dbsnap::config::{ConnectionConfig, DiskConfig};
use dbsnap::db::{DatabaseDriver, SqliteDriver};
use dbsnap::disk::Storage;
use dbsnap::snapshot::gzip_bytes;
use dbsnap::{App, Config};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

const SNAPSHOT_CONTENT: &str = include_str!("fixtures/snapshot_content.sql");

/// Fixture SQL with the model name filled in.
pub fn snapshot_content(model_name: &str) -> String {
    SNAPSHOT_CONTENT.replace("%%modelName%%", model_name)
}

pub struct Fixture {
    pub dir: TempDir,
    pub app: App,
    pub disk: Storage,
    pub database: PathBuf,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let database = dir.path().join("database.sqlite");
        let disk_root = dir.path().join("snapshotsDisk");

        let db = SqliteDriver::open(&database).expect("Failed to create database");
        db.execute(
            "CREATE TABLE \"models\" (\"id\" integer primary key autoincrement not null, \"name\" varchar not null);
             CREATE TABLE \"users\" (\"id\" integer primary key autoincrement not null, \"name\" varchar not null);
             CREATE TABLE \"posts\" (\"id\" integer primary key autoincrement not null, \"name\" varchar not null);",
        )
        .expect("Failed to create tables");
        drop(db);

        let mut config = Config::default();
        config.disks.insert(
            "snapshots".to_string(),
            DiskConfig {
                driver: "local".to_string(),
                root: Some(disk_root),
            },
        );
        config.connections.insert(
            "default".to_string(),
            ConnectionConfig {
                driver: "sqlite".to_string(),
                database: database.display().to_string(),
                host: None,
                port: None,
                username: None,
                password: None,
                socket: None,
                dump_binary_path: None,
            },
        );

        let app = App::new(config);
        let disk = app.storage(None).expect("Failed to open snapshots disk");

        for i in 1..=3 {
            disk.put(
                &format!("snapshot{i}.sql"),
                snapshot_content(&format!("snapshot{i}")).as_bytes(),
            )
            .await
            .expect("Failed to write snapshot");
        }

        // The next snapshot must be at least one second newer.
        tokio::time::sleep(Duration::from_millis(1100)).await;

        disk.put(
            "snapshot4.sql.gz",
            &gzip_bytes(snapshot_content("snapshot4").as_bytes()).expect("gzip"),
        )
        .await
        .expect("Failed to write snapshot");
        disk.put("otherfile.txt", b"not a snapshot")
            .await
            .expect("Failed to write file");

        Self {
            dir,
            app,
            disk,
            database,
        }
    }

    /// A fresh connection to the fixture database.
    pub fn db(&self) -> SqliteDriver {
        SqliteDriver::open(&self.database).expect("Failed to open database")
    }

    pub fn table_names(&self) -> Vec<String> {
        self.db().table_names().expect("Failed to list tables")
    }

    pub fn model_names(&self) -> Vec<String> {
        self.db().with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM models ORDER BY id")
                .expect("prepare");
            stmt.query_map([], |row| row.get(0))
                .expect("query")
                .collect::<rusqlite::Result<Vec<String>>>()
                .expect("rows")
        })
    }

    /// Text of a file on the snapshots disk.
    pub async fn disk_text(&self, file_name: &str) -> String {
        let data = self
            .disk
            .get(file_name)
            .await
            .expect("Failed to read file")
            .unwrap_or_else(|| panic!("{file_name} does not exist on disk"));
        String::from_utf8(data).expect("not UTF-8")
    }

    /// Runs a dbsnap command line, answering prompts from `input`.
    pub async fn run(&self, args: &[&str], input: &str) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("dbsnap").chain(args.iter().copied()))?;
        let mut input = input.as_bytes();
        let mut out = Vec::new();
        let mut console = Console::new(&mut input, &mut out);
        commands::execute(&self.app, cli.command, &mut console).await?;
        Ok(String::from_utf8(out)?)
    }
}
