//! UPDATE builder.

use crate::error::{SqlError, SqlResult};
use crate::expr::{Expr, Term};
use crate::stmt::cte::{Cte, CteList};
use crate::stmt::filter::Filters;
use crate::stmt::{SelectStmt, SqlStmt, write_returning};
use crate::value::Value;
use crate::writer::SqlWriter;

/// Right-hand side of a SET assignment.
#[derive(Clone, Debug)]
enum SetField {
    Value(Value),
    /// Raw SQL with one value per `?`, e.g. `count + ?`.
    Raw { sql: String, values: Vec<Value> },
    Term(Term),
}

/// UPDATE query builder.
#[derive(Clone, Debug)]
pub struct UpdateStmt {
    ctes: CteList,
    table: String,
    sets: Vec<(String, SetField)>,
    filters: Filters,
    returning: Vec<String>,
}

impl UpdateStmt {
    /// Create a new UPDATE builder.
    pub fn new(table: &str) -> Self {
        Self {
            ctes: CteList::new(),
            table: table.to_string(),
            sets: Vec::new(),
            filters: Filters::new(),
            returning: Vec::new(),
        }
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

    // ==================== SET ====================

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.sets.push((column.to_string(), SetField::Value(value.into())));
        self
    }

    /// Set an optional column value (None => skip).
    pub fn set_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to raw SQL (e.g. `now()`).
    pub fn set_raw(mut self, column: &str, sql: &str) -> Self {
        self.sets.push((
            column.to_string(),
            SetField::Raw {
                sql: sql.to_string(),
                values: Vec::new(),
            },
        ));
        self
    }

    /// Set a column to raw SQL with one value per `?` (e.g. `balance + ?`).
    pub fn set_template(mut self, column: &str, sql: &str, values: Vec<Value>) -> Self {
        self.sets.push((
            column.to_string(),
            SetField::Raw {
                sql: sql.to_string(),
                values,
            },
        ));
        self
    }

    /// Set a column to an expression or subquery.
    pub fn set_expr(mut self, column: &str, term: impl Into<Term>) -> Self {
        self.sets.push((column.to_string(), SetField::Term(term.into())));
        self
    }

    // ==================== WHERE ====================

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

    /// Add WHERE: column <> value
    pub fn ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::ne(column, value))
    }

    /// Add WHERE: column IN (values...)
    pub fn in_list<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_(Expr::in_list(column, values))
    }

    /// Raw filter with one value per `?`.
    pub fn where_raw(self, sql: &str, values: Vec<Value>) -> Self {
        self.where_(Expr::template(sql, values))
    }

    // ==================== RETURNING ====================

    pub fn returning(mut self, cols: &[&str]) -> Self {
        self.returning = cols.iter().map(|c| c.to_string()).collect();
        self
    }
}

impl SqlStmt for UpdateStmt {
    fn kind(&self) -> &'static str {
        "update"
    }

    fn write_sql(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        if self.sets.is_empty() {
            return Err(SqlError::NoAssignments(self.table.clone()));
        }

        self.ctes.write(w)?;
        w.push("UPDATE ").push_column(&self.table).push(" SET ");
        for (i, (column, field)) in self.sets.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push_column(column).push(" = ");
            match field {
                SetField::Value(value) => {
                    w.push_bind(value.clone());
                }
                SetField::Raw { sql, values } => {
                    w.push_raw(sql, values)?;
                }
                SetField::Term(term) => term.write(w)?,
            }
        }

        self.filters.write_prefixed(w, "WHERE")?;
        write_returning(w, &self.returning)
    }
}
