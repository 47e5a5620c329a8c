//! Target SQL dialects.
//!
//! The builders never hard-code quoting or placeholder syntax. Everything that
//! varies between databases is asked of a [`Dialect`]: identifier quoting, the
//! placeholder style applied by the final resolution pass, and whether native
//! functions exist or a fallback has to be rendered.

use std::fmt::Debug;

/// How bound-value placeholders appear in the final SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Every placeholder is the same marker (`?`).
    Generic,
    /// Placeholders are numbered from 1 (`$1, $2, ...`).
    Numbered,
}

/// How string concatenation is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatStyle {
    /// `a || b`
    Operator,
    /// `CONCAT(a, b)`
    Function,
}

/// How an upsert's conflict clause is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    /// `ON CONFLICT (target) DO UPDATE SET col = EXCLUDED.col`
    OnConflict,
    /// `ON DUPLICATE KEY UPDATE col = VALUES(col)`
    OnDuplicateKey,
}

/// The dialect contract consumed by every builder.
pub trait Dialect: Debug + Send + Sync {
    /// Short dialect name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Quote a single identifier segment.
    fn quote_identifier(&self, name: &str) -> String;

    /// Placeholder style for the resolution pass.
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Whether `GREATEST`/`LEAST` exist; otherwise multi-argument `MAX`/`MIN` are used.
    fn supports_greatest_least(&self) -> bool {
        true
    }

    fn concat_style(&self) -> ConcatStyle {
        ConcatStyle::Operator
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict
    }

    /// Reference to the row proposed for insertion inside a conflict action.
    fn excluded_column(&self, quoted_column: &str) -> String {
        match self.upsert_style() {
            UpsertStyle::OnConflict => format!("EXCLUDED.{quoted_column}"),
            UpsertStyle::OnDuplicateKey => format!("VALUES({quoted_column})"),
        }
    }

    fn supports_returning(&self) -> bool {
        true
    }

    /// LIMIT value meaning "no limit", for dialects that reject a bare OFFSET.
    fn unbounded_limit(&self) -> Option<&'static str> {
        None
    }

    /// Escape character LIKE uses when no `ESCAPE` clause is given.
    fn default_like_escape(&self) -> Option<char> {
        Some('\\')
    }
}

fn quote_with(name: &str, quote: char) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push(quote);
    for ch in name.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
    out
}

/// PostgreSQL: `"ident"`, `$n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"')
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }
}

/// MySQL: `` `ident` ``, `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '`')
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Generic
    }

    fn concat_style(&self) -> ConcatStyle {
        ConcatStyle::Function
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnDuplicateKey
    }

    fn supports_returning(&self) -> bool {
        false
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }
}

/// SQLite: `"ident"`, `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"')
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Generic
    }

    fn supports_greatest_least(&self) -> bool {
        false
    }

    fn excluded_column(&self, quoted_column: &str) -> String {
        format!("excluded.{quoted_column}")
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("-1")
    }

    fn default_like_escape(&self) -> Option<char> {
        None
    }
}

/// Resolve a built-in dialect by its configuration name.
pub fn dialect_by_name(name: &str) -> Option<&'static dyn Dialect> {
    match name.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" | "pg" => Some(&Postgres),
        "mysql" | "mariadb" => Some(&MySql),
        "sqlite" | "sqlite3" => Some(&Sqlite),
        _ => None,
    }
}
