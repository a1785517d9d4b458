//! `dbsnap list` - show the snapshots on a disk.

use anyhow::Result;
use chrono::Utc;
use std::io::Write;

use super::{Console, NO_SNAPSHOTS};
use crate::app::App;
use crate::cli::ListArgs;
use crate::utils::{format_age, format_bytes};

/// Execute the list command.
pub async fn execute(app: &App, args: ListArgs, console: &mut Console<'_>) -> Result<()> {
    let repo = app.repository(args.disk.as_deref())?;
    let mut snapshots = repo.all().await?;
    snapshots.reverse();

    if args.json {
        serde_json::to_writer_pretty(&mut *console.out, &snapshots)?;
        writeln!(console.out)?;
        return Ok(());
    }

    if snapshots.is_empty() {
        writeln!(console.out, "{NO_SNAPSHOTS}")?;
        return Ok(());
    }

    let now = Utc::now();
    let rows: Vec<[String; 4]> = snapshots
        .iter()
        .map(|s| {
            [
                s.name.clone(),
                s.file_name.clone(),
                format_age(s.created_at, now),
                format_bytes(s.size),
            ]
        })
        .collect();

    let headers = ["Name", "File", "Created", "Size"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    writeln!(console.out, "{}", table_line(&headers, &widths))?;
    for row in &rows {
        writeln!(console.out, "{}", table_line(row, &widths))?;
    }
    Ok(())
}

/// Pads cells to their column widths; the last column is right-aligned.
fn table_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let last = cells.len().saturating_sub(1);
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            let cell = cell.as_ref();
            if i == last {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_line_alignment() {
        let line = table_line(&["a", "a.sql.gz", "9 KB"], &[4, 8, 6]);
        assert_eq!(line, "a     a.sql.gz    9 KB");
    }
}
