//! DELETE builder.

use crate::error::SqlResult;
use crate::expr::{Expr, FALSE};
use crate::stmt::cte::{Cte, CteList};
use crate::stmt::filter::Filters;
use crate::stmt::{SelectStmt, SqlStmt, write_returning};
use crate::value::Value;
use crate::writer::SqlWriter;

/// DELETE query builder.
///
/// A DELETE whose filters render nothing becomes `WHERE 0=1` unless
/// [`DeleteStmt::allow_all`] was called.
#[derive(Clone, Debug)]
pub struct DeleteStmt {
    ctes: CteList,
    table: String,
    filters: Filters,
    returning: Vec<String>,
    allow_all: bool,
}

impl DeleteStmt {
    /// Create a new DELETE builder.
    pub fn new(table: &str) -> Self {
        Self {
            ctes: CteList::new(),
            table: table.to_string(),
            filters: Filters::new(),
            returning: Vec::new(),
            allow_all: false,
        }
    }

    /// Permit deleting every row when no filter applies.
    pub fn allow_all(mut self) -> Self {
        self.allow_all = true;
        self
    }

    /// Add `WITH name AS (query)`.
    pub fn with(mut self, name: &str, query: SelectStmt) -> SqlResult<Self> {
        self.ctes.push(Cte::new(name, query)?);
        Ok(self)
    }

    pub fn with_cte(mut self, cte: Cte) -> Self {
        self.ctes.push(cte);
        self
    }

    pub fn where_(mut self, expr: impl Into<Expr>) -> Self {
        self.filters.push(expr.into());
        self
    }

    pub fn and_where(self, expr: impl Into<Expr>) -> Self {
        self.where_(expr)
    }

    pub fn or_where(mut self, expr: impl Into<Expr>) -> Self {
        self.filters.or(expr.into());
        self
    }

    /// Add WHERE: column = value
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::eq(column, value))
    }

    /// Add WHERE: column < value
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::lt(column, value))
    }

    /// Add WHERE: column IN (values...)
    pub fn in_list<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_(Expr::in_list(column, values))
    }

    /// Add WHERE: column NOT IN (values...)
    pub fn not_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_(Expr::not_in(column, values))
    }

    /// Raw filter with one value per `?`.
    pub fn where_raw(self, sql: &str, values: Vec<Value>) -> Self {
        self.where_(Expr::template(sql, values))
    }

    pub fn returning(mut self, cols: &[&str]) -> Self {
        self.returning = cols.iter().map(|c| c.to_string()).collect();
        self
    }
}

impl SqlStmt for DeleteStmt {
    fn kind(&self) -> &'static str {
        "delete"
    }

    fn write_sql(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        self.ctes.write(w)?;
        w.push("DELETE FROM ").push_column(&self.table);

        let mut cond = w.sub();
        self.filters.write(&mut cond)?;
        if !cond.is_empty() {
            w.push(" WHERE ").append(cond);
        } else if !self.allow_all {
            w.push(" WHERE ").push(FALSE);
        }

        write_returning(w, &self.returning)
    }
}
