//! CTE (WITH clause) support.
//!
//! A [`CteList`] renders the `WITH [RECURSIVE]` prologue of a statement.
//! Each entry's body is a complete [`SelectStmt`] render, so its values land
//! ahead of the statement body's values, in declaration order.
//!
//! # Example
//! ```ignore
//! use sqlweave::{stmt, Expr, SqlStmt, Postgres};
//!
//! // Recursive CTE: anchor UNION ALL recursive term
//! let anchor = stmt::select("employees")
//!     .select_cols(&["id", "parent_id"])
//!     .is_null("parent_id");
//! let step = stmt::select("employees e")
//!     .select_cols(&["e.id", "e.parent_id"])
//!     .inner_join("org_tree t", "e.parent_id = t.id");
//!
//! let tree = stmt::select("org_tree")
//!     .with_recursive("org_tree", anchor.union_all(step))?
//!     .build(&Postgres)?;
//! ```

use crate::error::{SqlError, SqlResult};
use crate::ident::{Ident, IdentPart};
use crate::stmt::{SelectStmt, SqlStmt};
use crate::writer::SqlWriter;

/// A single named CTE.
#[derive(Clone, Debug)]
pub struct Cte {
    name: String,
    columns: Vec<String>,
    query: SelectStmt,
    recursive: bool,
}

impl Cte {
    /// Declare `name AS (query)`.
    pub fn new(name: &str, query: SelectStmt) -> SqlResult<Self> {
        let name = validate_name(name)?;
        if query.is_empty() {
            return Err(SqlError::invalid_cte(format!("CTE '{name}' has no query")));
        }
        Ok(Self {
            name,
            columns: Vec::new(),
            query,
            recursive: false,
        })
    }

    /// Declare a recursive CTE. The body must be `anchor UNION [ALL] recursive-term`.
    pub fn recursive(name: &str, query: SelectStmt) -> SqlResult<Self> {
        let mut cte = Self::new(name, query)?;
        if !cte.query.is_union() {
            return Err(SqlError::RecursiveCteNotUnion(cte.name));
        }
        cte.recursive = true;
        Ok(cte)
    }

    /// Name the CTE's output columns: `name(col1, col2) AS (...)`.
    pub fn columns(mut self, columns: &[&str]) -> SqlResult<Self> {
        self.columns = columns
            .iter()
            .map(|c| validate_name(c))
            .collect::<SqlResult<_>>()?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    fn write(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        w.push_name(&self.name);
        if !self.columns.is_empty() {
            w.push("(");
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push_name(col);
            }
            w.push(")");
        }
        let mut sub = w.sub();
        self.query.write_sql(&mut sub)?;
        w.push(" AS ").append_wrapped(sub);
        Ok(())
    }
}

fn validate_name(name: &str) -> SqlResult<String> {
    if name.trim().is_empty() {
        return Err(SqlError::invalid_cte("CTE name cannot be empty"));
    }
    let ident = Ident::parse(name)
        .map_err(|e| SqlError::invalid_cte(format!("invalid name '{name}': {e}")))?;
    match ident.parts.as_slice() {
        [IdentPart::Name(part)] => Ok(part.clone()),
        _ => Err(SqlError::invalid_cte(format!(
            "name '{name}' must be a single identifier"
        ))),
    }
}

/// Ordered CTE declarations of one statement.
#[derive(Clone, Debug, Default)]
pub struct CteList {
    items: Vec<Cte>,
}

impl CteList {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, cte: Cte) {
        self.items.push(cte);
    }

    /// Write `WITH [RECURSIVE] a AS (...), b AS (...) ` (with trailing space).
    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        if self.items.is_empty() {
            return Ok(());
        }
        w.push("WITH ");
        if self.items.iter().any(Cte::is_recursive) {
            w.push("RECURSIVE ");
        }
        for (i, cte) in self.items.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            cte.write(w)?;
        }
        w.push(" ");
        Ok(())
    }
}
