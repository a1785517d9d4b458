//! `dbsnap cleanup` - keep only the newest snapshots.

use anyhow::Result;
use std::io::Write;

use super::Console;
use crate::app::App;
use crate::cli::CleanupArgs;

/// Execute the cleanup command.
pub async fn execute(app: &App, args: CleanupArgs, console: &mut Console<'_>) -> Result<()> {
    let repo = app.repository(args.disk.as_deref())?;
    let removed = repo.cleanup(args.keep).await?;

    if removed.is_empty() {
        writeln!(console.out, "Nothing to clean up.")?;
        return Ok(());
    }
    for file_name in &removed {
        writeln!(console.out, "Deleted `{file_name}`")?;
    }
    writeln!(
        console.out,
        "Removed {} snapshot(s), kept the {} newest.",
        removed.len(),
        args.keep
    )?;
    Ok(())
}
