//! Placeholder resolution pass.
//!
//! Builders emit a single dialect-neutral marker (`?`) for every bound value.
//! Once a statement is fully assembled, one linear scan turns the markers into
//! the dialect's syntax. The scan has no SQL knowledge: a `?` typed inside
//! raw SQL text counts as a marker, which is why raw fragments are checked
//! for marker/value parity when they are written.

use crate::dialect::{Dialect, PlaceholderStyle};
use crate::error::{SqlError, SqlResult};
use std::fmt::Write;

/// The dialect-neutral placeholder marker.
pub const MARKER: char = '?';

/// Count marker occurrences in `sql`.
pub fn count_markers(sql: &str) -> usize {
    sql.chars().filter(|&c| c == MARKER).count()
}

/// Rewrite neutral markers into `dialect` placeholders.
///
/// Fails with [`SqlError::PlaceholderMismatch`] unless the text holds exactly
/// `arg_count` markers. Numbering starts at 1 on every call, so this must run
/// once per top-level statement.
pub fn resolve_placeholders(
    sql: &str,
    arg_count: usize,
    dialect: &dyn Dialect,
) -> SqlResult<String> {
    let resolved = match dialect.placeholder_style() {
        PlaceholderStyle::Generic => {
            let markers = count_markers(sql);
            if markers != arg_count {
                return Err(SqlError::PlaceholderMismatch {
                    markers,
                    args: arg_count,
                });
            }
            sql.to_string()
        }
        PlaceholderStyle::Numbered => {
            let mut out = String::with_capacity(sql.len() + arg_count * 2);
            let mut idx = 0usize;
            for ch in sql.chars() {
                if ch == MARKER {
                    idx += 1;
                    let _ = write!(&mut out, "${idx}");
                } else {
                    out.push(ch);
                }
            }
            if idx != arg_count {
                return Err(SqlError::PlaceholderMismatch {
                    markers: idx,
                    args: arg_count,
                });
            }
            out
        }
    };
    Ok(resolved)
}
