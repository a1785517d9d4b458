//! Terminal output and prompts.
//!
//! Prompts read from any `BufRead` and write to any `Write`, so commands can
//! be driven by stdin in the binary and by byte buffers in tests.

use anyhow::Result;
use std::io::{BufRead, Write};

/// Width of error box separators.
const ERROR_BOX_WIDTH: usize = 60;

/// Print an error box with a title and optional details to stderr.
///
/// ```text
/// ============================================================
/// Snapshot load failed
/// ============================================================
///
/// <details>
/// ```
pub fn print_error_box(title: &str, details: Option<&str>) {
    eprintln!("\n{}", "=".repeat(ERROR_BOX_WIDTH));
    eprintln!("{title}");
    eprintln!("{}", "=".repeat(ERROR_BOX_WIDTH));

    if let Some(details) = details
        && !details.is_empty()
    {
        eprintln!("\n{details}");
    }
}

/// Asks a yes/no question. An empty answer picks `default`.
///
/// # Errors
///
/// Returns an error if reading or writing fails.
pub fn confirm(
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    question: &str,
    default: bool,
) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    write!(out, "{question} {hint} ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(match answer.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    })
}

/// Asks the user to pick one of `options` by number or by value.
///
/// The first option is the default. Returns `None` if the answer matches
/// nothing, input is closed, or there is nothing to choose from.
///
/// # Errors
///
/// Returns an error if reading or writing fails.
pub fn choose(
    input: &mut dyn BufRead,
    out: &mut dyn Write,
    title: &str,
    options: &[String],
) -> Result<Option<usize>> {
    if options.is_empty() {
        return Ok(None);
    }

    writeln!(out)?;
    writeln!(out, "{title}")?;
    for (i, option) in options.iter().enumerate() {
        writeln!(out, "  [{}] {option}", i + 1)?;
    }
    write!(out, "\nEnter choice [1]: ")?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(None);
    }
    let answer = answer.trim();

    if answer.is_empty() {
        return Ok(Some(0));
    }
    if let Ok(n) = answer.parse::<usize>() {
        return Ok((1..=options.len()).contains(&n).then(|| n - 1));
    }
    Ok(options.iter().position(|o| o == answer))
}
