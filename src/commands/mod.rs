//! CLI command implementations for dbsnap.
//!
//! Each submodule implements one subcommand:
//!
//! - [`create`] - Dump a connection into a new snapshot
//! - [`list`] - Show the snapshots on a disk
//! - [`load`] - Restore a snapshot into a connection
//! - [`delete`] - Remove a snapshot
//! - [`cleanup`] - Keep only the newest snapshots
//! - [`download`] - Copy a snapshot to a local file
//!
//! Commands write to a [`Console`] instead of stdout so they can be driven
//! from tests.

pub mod cleanup;
pub mod create;
pub mod delete;
pub mod download;
pub mod list;
pub mod load;

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::app::App;
use crate::cli::Commands;
use crate::error::Error;
use crate::snapshot::{Snapshot, SnapshotRepository};
use crate::ui;

/// Input and output streams of a command.
pub struct Console<'a> {
    pub input: &'a mut dyn BufRead,
    pub out: &'a mut dyn Write,
}

impl<'a> Console<'a> {
    pub fn new(input: &'a mut dyn BufRead, out: &'a mut dyn Write) -> Self {
        Self { input, out }
    }
}

/// Message printed when a disk holds no snapshots.
pub const NO_SNAPSHOTS: &str = "No snapshots found. Run `dbsnap create` first to create snapshots.";

/// Run a parsed subcommand.
pub async fn execute(app: &App, command: Commands, console: &mut Console<'_>) -> Result<()> {
    match command {
        Commands::Create(args) => create::execute(app, args, console).await,
        Commands::List(args) => list::execute(app, args, console).await,
        Commands::Load(args) => load::execute(app, args, console).await,
        Commands::Delete(args) => delete::execute(app, args, console).await,
        Commands::Cleanup(args) => cleanup::execute(app, args, console).await,
        Commands::Download(args) => download::execute(app, args, console).await,
    }
}

/// Resolve the snapshot a command acts on.
///
/// With a name, the newest matching snapshot (missing is an error). Without
/// one, the user picks from the snapshots on the disk, newest first.
/// Returns `None` if there is nothing to pick.
pub(crate) async fn select_snapshot(
    repo: &SnapshotRepository,
    name: Option<&str>,
    console: &mut Console<'_>,
    prompt: &str,
) -> Result<Option<Snapshot>> {
    let mut snapshots = repo.all().await?;
    if let Some(name) = name {
        let matching: Vec<&Snapshot> = snapshots.iter().filter(|s| s.matches(name)).collect();
        let snapshot = matching
            .last()
            .map(|s| (*s).clone())
            .ok_or_else(|| Error::not_found(name))?;
        if matching.len() > 1 {
            writeln!(
                console.out,
                "{} snapshots are named `{name}`; using the newest, `{}`.",
                matching.len(),
                snapshot.file_name
            )?;
        }
        return Ok(Some(snapshot));
    }

    if snapshots.is_empty() {
        writeln!(console.out, "{NO_SNAPSHOTS}")?;
        return Ok(None);
    }
    snapshots.reverse();

    let names: Vec<String> = snapshots.iter().map(|s| s.file_name.clone()).collect();
    match ui::choose(&mut *console.input, &mut *console.out, prompt, &names)? {
        Some(index) => Ok(Some(snapshots.swap_remove(index))),
        None => anyhow::bail!("Invalid choice"),
    }
}
