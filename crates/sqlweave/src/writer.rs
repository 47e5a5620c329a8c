//! Fragment writer shared by expressions and statements.
//!
//! `SqlWriter` stores SQL text and bound values side by side: every call to
//! [`SqlWriter::push_bind`] appends one neutral marker and one value, so the
//! i-th marker in the text always pairs with the i-th value. Nested
//! fragments are rendered into a [`SqlWriter::sub`] writer and appended whole,
//! which keeps that pairing through any depth of nesting.

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::ident::quote_column;
use crate::placeholder::{MARKER, count_markers, resolve_placeholders};
use crate::value::Value;

/// A rendered statement: final SQL text plus its ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Built {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Built {
    /// Number of placeholders in the final SQL, counted in `dialect` syntax.
    pub fn placeholder_count(&self, dialect: &dyn Dialect) -> usize {
        use crate::dialect::PlaceholderStyle;
        match dialect.placeholder_style() {
            PlaceholderStyle::Generic => count_markers(&self.sql),
            PlaceholderStyle::Numbered => {
                let bytes = self.sql.as_bytes();
                bytes
                    .iter()
                    .enumerate()
                    .filter(|&(i, &b)| {
                        b == b'$' && bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit())
                    })
                    .count()
            }
        }
    }
}

#[cfg(feature = "postgres")]
impl Built {
    /// Get arguments as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.args
            .iter()
            .map(|v| v as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect()
    }
}

/// Accumulates dialect-neutral SQL and its bound values.
#[derive(Debug)]
pub struct SqlWriter<'d> {
    dialect: &'d dyn Dialect,
    sql: String,
    args: Vec<Value>,
}

impl<'d> SqlWriter<'d> {
    /// Create an empty writer for `dialect`.
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            args: Vec::new(),
        }
    }

    /// A fresh writer for a nested fragment.
    pub fn sub(&self) -> SqlWriter<'d> {
        SqlWriter::new(self.dialect)
    }

    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Append SQL text that contains no placeholders.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind(&mut self, value: Value) -> &mut Self {
        self.sql.push(MARKER);
        self.args.push(value);
        self
    }

    /// Append a comma-separated list of placeholders.
    pub fn push_bind_list(&mut self, values: impl IntoIterator<Item = Value>) -> &mut Self {
        for (i, v) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_bind(v);
        }
        self
    }

    /// Append a column reference, quoted when it is a plain identifier.
    pub fn push_column(&mut self, name: &str) -> &mut Self {
        let quoted = quote_column(self.dialect, name);
        self.sql.push_str(&quoted);
        self
    }

    /// Append a single name (alias, CTE name) quoted unconditionally.
    pub fn push_name(&mut self, name: &str) -> &mut Self {
        let quoted = self.dialect.quote_identifier(name);
        self.sql.push_str(&quoted);
        self
    }

    /// Append raw SQL whose markers are satisfied by `values`.
    pub fn push_raw(&mut self, sql: &str, values: &[Value]) -> SqlResult<&mut Self> {
        let markers = count_markers(sql);
        if markers != values.len() {
            return Err(SqlError::PlaceholderMismatch {
                markers,
                args: values.len(),
            });
        }
        self.sql.push_str(sql);
        self.args.extend_from_slice(values);
        Ok(self)
    }

    /// Append a fragment rendered by a [`SqlWriter::sub`] writer.
    pub fn append(&mut self, other: SqlWriter<'_>) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.args.extend(other.args);
        self
    }

    /// Append a nested fragment wrapped in parentheses.
    pub fn append_wrapped(&mut self, other: SqlWriter<'_>) -> &mut Self {
        self.sql.push('(');
        self.append(other);
        self.sql.push(')');
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// The neutral SQL written so far.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Take the neutral SQL and its values.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }

    /// Run the placeholder resolution pass and produce the final statement.
    pub fn finish(self) -> SqlResult<Built> {
        let sql = resolve_placeholders(&self.sql, self.args.len(), self.dialect)?;
        Ok(Built {
            sql,
            args: self.args,
        })
    }
}
