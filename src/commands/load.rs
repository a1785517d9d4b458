//! `dbsnap load` - restore a snapshot into a connection.

use anyhow::Result;
use std::io::Write;

use super::{Console, NO_SNAPSHOTS, select_snapshot};
use crate::app::App;
use crate::cli::LoadArgs;
use crate::db::LoadMode;
use crate::snapshot::LoadOptions;
use crate::ui;

/// Execute the load command.
pub async fn execute(app: &App, args: LoadArgs, console: &mut Console<'_>) -> Result<()> {
    let repo = app.repository(args.disk.as_deref())?;

    let selected = if args.latest {
        let latest = repo.latest().await?;
        if latest.is_none() {
            writeln!(console.out, "{NO_SNAPSHOTS}")?;
        }
        latest
    } else {
        select_snapshot(
            &repo,
            args.name.as_deref(),
            console,
            "Which snapshot should be loaded?",
        )
        .await?
    };
    let Some(snapshot) = selected else {
        return Ok(());
    };

    let connection = app.connection_name(args.connection.as_deref()).to_string();
    if !args.force {
        let question = format!(
            "Load snapshot `{}` into connection `{connection}`? Existing data will be replaced.",
            snapshot.name
        );
        if !ui::confirm(&mut *console.input, &mut *console.out, &question, false)? {
            writeln!(console.out, "Aborted.")?;
            return Ok(());
        }
    }

    let driver = app.driver(Some(&connection))?;
    let options = LoadOptions {
        drop_tables: args.drop_tables,
        mode: if args.stream {
            LoadMode::Streaming
        } else {
            LoadMode::Buffered
        },
    };

    writeln!(console.out, "Loading snapshot `{}`...", snapshot.name)?;
    app.loader()
        .load(repo.storage(), &snapshot, driver, options)
        .await?;
    writeln!(console.out, "Snapshot `{}` loaded!", snapshot.name)?;
    Ok(())
}
