//! WHERE/HAVING filter lists.

use crate::error::SqlResult;
use crate::expr::{Expr, write_clause};
use crate::writer::SqlWriter;

/// An ordered filter list combined by implicit AND.
///
/// `or` does not append: it folds everything accumulated so far into one
/// group and ORs it with the new operand, so repeated calls nest to the left:
///
/// ```text
/// where(a).and_where(b).or_where(c)   =>  (a AND b) OR (c)
///                          .or_where(d)  =>  ((a AND b) OR (c)) OR (d)
/// ```
#[derive(Clone, Debug, Default)]
pub struct Filters {
    items: Vec<Expr>,
}

impl Filters {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append under implicit AND.
    pub fn push(&mut self, expr: Expr) {
        self.items.push(expr);
    }

    /// Replace the list with `(accumulated) OR (expr)`.
    pub fn or(&mut self, expr: Expr) {
        if self.items.is_empty() {
            self.items.push(expr);
            return;
        }
        let accumulated = std::mem::take(&mut self.items);
        self.items.push(Expr::Or(vec![
            Expr::Clause(accumulated),
            Expr::Clause(vec![expr]),
        ]));
    }

    /// Write the conjunction without a keyword.
    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        write_clause(w, &self.items)
    }

    /// Write ` KEYWORD conditions` when the list renders non-empty.
    pub(crate) fn write_prefixed(&self, w: &mut SqlWriter<'_>, keyword: &str) -> SqlResult<()> {
        let mut sub = w.sub();
        self.write(&mut sub)?;
        if !sub.is_empty() {
            w.push(" ").push(keyword).push(" ").append(sub);
        }
        Ok(())
    }
}
