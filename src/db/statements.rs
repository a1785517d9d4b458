//! Line-oriented SQL statement splitter for streamed restores.
//!
//! Dumps produced by `sqlite3`, `mysqldump` and `pg_dump --inserts` terminate
//! every statement with `;` at the end of a line. The splitter relies on that
//! and tracks SQLite-style quoting (doubled quotes, no backslash escapes), so
//! lines inside a string literal or quoted identifier are kept verbatim.

use std::io::{self, BufRead};

/// Iterator over the statements of a SQL script.
///
/// Blank lines and `--` comment lines are skipped. A statement is complete
/// when it is outside any quote and its trimmed text ends with `;`. Text left
/// over at end of input that never reached a `;` is dropped.
pub struct Statements<R> {
    reader: R,
    line: String,
    finished: bool,
}

impl<R: BufRead> Statements<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            finished: false,
        }
    }
}

fn should_ignore(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with("--")
}

/// Quote still open after scanning `text`, starting from `open`.
fn open_quote(mut open: Option<char>, text: &str) -> Option<char> {
    for c in text.chars() {
        open = match open {
            None if c == '\'' || c == '"' => Some(c),
            Some(q) if c == q => None,
            other => other,
        };
    }
    open
}

impl<R: BufRead> Iterator for Statements<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut statement = String::new();
        let mut quote = None;
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.finished = true;
                    if !statement.trim().is_empty() {
                        tracing::debug!(
                            bytes = statement.len(),
                            "Dropping unterminated trailing statement"
                        );
                    }
                    return None;
                },
                Ok(_) => {},
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                },
            }

            if quote.is_none() && should_ignore(&self.line) {
                continue;
            }

            statement.push_str(&self.line);
            quote = open_quote(quote, &self.line);

            if quote.is_none() && statement.trim_end().ends_with(';') {
                let end = statement.trim_end_matches(['\n', '\r']).len();
                statement.truncate(end);
                return Some(Ok(statement));
            }
        }
    }
}
