//! `dbsnap create` - dump a connection into a new snapshot.

use anyhow::Result;
use std::io::Write;

use super::Console;
use crate::app::App;
use crate::cli::CreateArgs;
use crate::utils::format_bytes;

/// Execute the create command.
pub async fn execute(app: &App, args: CreateArgs, console: &mut Console<'_>) -> Result<()> {
    let storage = app.storage(args.disk.as_deref())?;
    let connection = app.connection_name(args.connection.as_deref()).to_string();
    let driver = app.driver(Some(&connection))?;

    let mut options = app.create_options(args.name, &connection);
    options.compress |= args.compress;
    options.dump = app.dump_options(args.tables, args.exclude);

    writeln!(console.out, "Creating new snapshot...")?;
    let snapshot = app.factory().create(&storage, driver, options).await?;

    writeln!(
        console.out,
        "Snapshot `{}` created ({})",
        snapshot.name,
        format_bytes(snapshot.size)
    )?;
    Ok(())
}
