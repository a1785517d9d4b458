//! Command-line interface definition.

use crate::constants;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dbsnap")]
#[command(version, about = "Create, load and manage database snapshots")]
pub struct Cli {
    /// Config file (default: ./dbsnap.toml when present)
    #[arg(long, global = true, env = constants::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump a database into a new snapshot
    Create(CreateArgs),
    /// List snapshots, newest first
    List(ListArgs),
    /// Load a snapshot into a database
    Load(LoadArgs),
    /// Delete a snapshot
    Delete(DeleteArgs),
    /// Delete all but the newest snapshots
    Cleanup(CleanupArgs),
    /// Copy a snapshot to a local file
    Download(DownloadArgs),
}

#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Snapshot name (default: current date and time)
    pub name: Option<String>,

    /// Connection to dump
    #[arg(long)]
    pub connection: Option<String>,

    /// Disk to store the snapshot on
    #[arg(long)]
    pub disk: Option<String>,

    /// Gzip the snapshot
    #[arg(long)]
    pub compress: bool,

    /// Only dump this table (repeatable)
    #[arg(long = "table", value_name = "TABLE")]
    pub tables: Vec<String>,

    /// Skip this table (repeatable)
    #[arg(long = "exclude", value_name = "TABLE")]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Disk to list
    #[arg(long)]
    pub disk: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Snapshot to load (prompted when omitted)
    pub name: Option<String>,

    /// Connection to load into
    #[arg(long)]
    pub connection: Option<String>,

    /// Disk to load from
    #[arg(long)]
    pub disk: Option<String>,

    /// Load the most recent snapshot
    #[arg(long, conflicts_with = "name")]
    pub latest: bool,

    /// Execute statements one at a time instead of as one batch
    #[arg(long)]
    pub stream: bool,

    /// Drop all tables before loading
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, value_name = "BOOL")]
    pub drop_tables: bool,

    /// Do not ask for confirmation
    #[arg(long)]
    pub force: bool,
}

impl Default for LoadArgs {
    fn default() -> Self {
        Self {
            name: None,
            connection: None,
            disk: None,
            latest: false,
            stream: false,
            drop_tables: true,
            force: false,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct DeleteArgs {
    /// Snapshot to delete (prompted when omitted)
    pub name: Option<String>,

    /// Disk to delete from
    #[arg(long)]
    pub disk: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct CleanupArgs {
    /// Number of snapshots to keep
    #[arg(long)]
    pub keep: usize,

    /// Disk to clean up
    #[arg(long)]
    pub disk: Option<String>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Snapshot to download
    pub name: String,

    /// Local destination file
    pub dest: PathBuf,

    /// Disk to download from
    #[arg(long)]
    pub disk: Option<String>,

    /// Write plain SQL for gzip snapshots
    #[arg(long)]
    pub decompress: bool,
}
