//! `dbsnap download` - copy a snapshot to a local file.

use anyhow::Result;
use std::io::Write;

use super::Console;
use crate::app::App;
use crate::cli::DownloadArgs;
use crate::utils::format_bytes;

/// Execute the download command.
pub async fn execute(app: &App, args: DownloadArgs, console: &mut Console<'_>) -> Result<()> {
    let repo = app.repository(args.disk.as_deref())?;
    let snapshot = repo.get(&args.name).await?;
    let written = repo
        .download(&snapshot, &args.dest, args.decompress)
        .await?;

    writeln!(
        console.out,
        "Downloaded `{}` to {} ({})",
        snapshot.file_name,
        args.dest.display(),
        format_bytes(written)
    )?;
    Ok(())
}
