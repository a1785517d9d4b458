//! `dbsnap delete` - remove a snapshot.

use anyhow::Result;
use std::io::Write;

use super::{Console, select_snapshot};
use crate::app::App;
use crate::cli::DeleteArgs;

/// Execute the delete command.
pub async fn execute(app: &App, args: DeleteArgs, console: &mut Console<'_>) -> Result<()> {
    let repo = app.repository(args.disk.as_deref())?;
    let Some(snapshot) = select_snapshot(
        &repo,
        args.name.as_deref(),
        console,
        "Which snapshot should be deleted?",
    )
    .await?
    else {
        return Ok(());
    };

    let name = snapshot.name.clone();
    repo.delete(snapshot).await?;
    writeln!(console.out, "Snapshot `{name}` deleted!")?;
    Ok(())
}
