//! Type definitions shared by the database drivers.

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// SQL value as read from a SQLite row.
///
/// Mirrors SQLite's storage classes so a dump can render every cell back into
/// an equivalent SQL literal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL value
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Real(f64),
    /// UTF-8 text string
    Text(String),
    /// TEXT whose bytes are not valid UTF-8
    RawText(Vec<u8>),
    /// Binary blob data
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for Value {
    fn from(value_ref: ValueRef<'_>) -> Self {
        match value_ref {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(r) => Self::Real(r),
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(s) => Self::Text(s.to_string()),
                Err(_) => Self::RawText(t.to_vec()),
            },
            ValueRef::Blob(b) => Self::Blob(b.to_vec()),
        }
    }
}

impl Value {
    /// Renders the value as a SQLite literal usable in an `INSERT`.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Real(r) if r.is_nan() => "NULL".to_string(),
            Self::Real(r) if r.is_infinite() => {
                if r.is_sign_positive() {
                    "9.0e999".to_string()
                } else {
                    "-9.0e999".to_string()
                }
            },
            // Debug keeps a decimal point or exponent, so the value stays REAL.
            Self::Real(r) => format!("{r:?}"),
            Self::Text(s) => text_literal(s),
            Self::RawText(b) => format!("CAST(X'{}' AS TEXT)", hex::encode_upper(b)),
            Self::Blob(b) => format!("X'{}'", hex::encode_upper(b)),
        }
    }
}

/// Renders text so the literal never spans lines.
///
/// Line breaks are swapped for an escape token that does not occur in the
/// text and restored with `replace(.., char(10))` when the statement runs,
/// the same shape the `sqlite3` shell's `.dump` writes.
fn text_literal(s: &str) -> String {
    let breaks = [('\r', "\\r", 13), ('\n', "\\n", 10)];
    let mut body = s.to_string();
    let mut restores = Vec::new();
    for (ch, base, code) in breaks {
        if !s.contains(ch) {
            continue;
        }
        let token = unused_token(s, base);
        body = body.replace(ch, &token);
        restores.push((token, code));
    }

    let mut literal = quote_literal(&body);
    for (token, code) in restores {
        literal = format!("replace({literal},{},char({code}))", quote_literal(&token));
    }
    literal
}

fn unused_token(s: &str, base: &str) -> String {
    let mut token = base.to_string();
    let mut suffix = 0;
    while s.contains(&token) {
        suffix += 1;
        token = format!("{base}{suffix}");
    }
    token
}

/// Quotes a string literal, doubling embedded single quotes.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quotes an identifier with double quotes (SQLite / PostgreSQL).
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Which tables a dump covers, plus extra client arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Only dump these tables. `None` dumps every table.
    pub tables: Option<Vec<String>>,
    /// Skip these tables.
    pub exclude: Vec<String>,
    /// Extra arguments passed verbatim to dump binaries.
    pub extra_options: Vec<String>,
}

impl DumpOptions {
    /// Whether a table is part of the dump.
    pub fn includes(&self, table: &str) -> bool {
        if self.exclude.iter().any(|t| t == table) {
            return false;
        }
        match &self.tables {
            Some(tables) => tables.iter().any(|t| t == table),
            None => true,
        }
    }

    /// Rejects option combinations no dumper can honor.
    ///
    /// # Errors
    ///
    /// Returns an error when both an include list and an exclude list are set.
    pub fn validate(&self) -> crate::Result<()> {
        if self.tables.as_ref().is_some_and(|t| !t.is_empty()) && !self.exclude.is_empty() {
            return Err(crate::Error::InvalidOptions(
                "cannot combine a table list with excluded tables".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a snapshot's SQL is fed to the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Read the whole script and execute it as one batch.
    #[default]
    Buffered,
    /// Split the script into statements and execute them one at a time.
    Streaming,
}

/// Connection settings for server databases reached through client binaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub socket: Option<String>,
    /// Directory holding the client binaries; `PATH` is used when unset.
    pub binary_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::Integer(-7).to_sql_literal(), "-7");
        assert_eq!(Value::Real(1.0).to_sql_literal(), "1.0");
        assert_eq!(Value::Real(f64::INFINITY).to_sql_literal(), "9.0e999");
        assert_eq!(Value::Real(f64::NAN).to_sql_literal(), "NULL");
        assert_eq!(Value::Text("it's".to_string()).to_sql_literal(), "'it''s'");
        assert_eq!(Value::Blob(vec![0x00, 0xab]).to_sql_literal(), "X'00AB'");
        assert_eq!(
            Value::RawText(vec![0xff, 0x41]).to_sql_literal(),
            "CAST(X'FF41' AS TEXT)"
        );
    }

    #[test]
    fn test_multi_line_text_stays_on_one_line() {
        let literal = Value::Text("line one\n\nit's".to_string()).to_sql_literal();
        assert_eq!(literal, r"replace('line one\n\nit''s','\n',char(10))");

        let literal = Value::Text("a\r\nb".to_string()).to_sql_literal();
        assert_eq!(
            literal,
            r"replace(replace('a\r\nb','\r',char(13)),'\n',char(10))"
        );
        assert!(!literal.contains(['\n', '\r']));
    }

    #[test]
    fn test_escape_token_avoids_existing_text() {
        let literal = Value::Text(r"C:\new".to_string() + "\nx").to_sql_literal();
        assert_eq!(literal, r"replace('C:\new\n1x','\n1',char(10))");
    }

    #[test]
    fn test_invalid_utf8_text_keeps_raw_bytes() {
        let value = Value::from(ValueRef::Text(&[0xff, 0x41]));
        assert_eq!(value, Value::RawText(vec![0xff, 0x41]));
        assert_eq!(
            Value::from(ValueRef::Text(b"ok")),
            Value::Text("ok".to_string())
        );
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("models"), "\"models\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_includes() {
        let all = DumpOptions::default();
        assert!(all.includes("users"));

        let only = DumpOptions {
            tables: Some(vec!["users".into()]),
            ..DumpOptions::default()
        };
        assert!(only.includes("users"));
        assert!(!only.includes("posts"));

        let skip = DumpOptions {
            exclude: vec!["posts".into()],
            ..DumpOptions::default()
        };
        assert!(skip.includes("users"));
        assert!(!skip.includes("posts"));
    }

    #[test]
    fn test_validate_rejects_include_and_exclude() {
        let both = DumpOptions {
            tables: Some(vec!["users".into()]),
            exclude: vec!["posts".into()],
            ..DumpOptions::default()
        };
        assert!(matches!(
            both.validate(),
            Err(crate::Error::InvalidOptions(_))
        ));
        assert!(DumpOptions::default().validate().is_ok());
    }
}
