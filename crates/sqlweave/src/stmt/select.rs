//! SELECT builder.

use crate::error::{SqlError, SqlResult};
use crate::expr::{Expr, LikeExpr, Term};
use crate::ident::{Ident, IdentPart};
use crate::stmt::cte::{Cte, CteList};
use crate::stmt::filter::Filters;
use crate::stmt::{SqlStmt, write_column_list};
use crate::value::Value;
use crate::writer::SqlWriter;

/// One projection entry.
#[derive(Clone, Debug)]
pub enum SelectItem {
    /// Column name or verbatim SQL such as `COUNT(*) AS cnt`.
    Column(String),
    /// Expression with an optional alias; its values bind before the source.
    Term { term: Term, alias: Option<String> },
}

/// FROM or JOIN target.
#[derive(Clone, Debug)]
pub enum Source {
    Table {
        name: String,
        alias: Option<String>,
    },
    Subquery {
        query: Box<SelectStmt>,
        alias: String,
    },
}

impl Source {
    fn write(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        match self {
            Source::Table { name, alias } => {
                w.push_column(name);
                if let Some(alias) = alias {
                    w.push(" AS ").push_name(alias);
                }
            }
            Source::Subquery { query, alias } => {
                let mut sub = w.sub();
                query.write_sql(&mut sub)?;
                w.append_wrapped(sub).push(" AS ").push_name(alias);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Clone, Debug)]
struct Join {
    kind: JoinKind,
    target: Source,
    on: Option<Expr>,
}

/// Set operation joining two SELECTs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOp {
    pub fn as_str(self) -> &'static str {
        match self {
            SetOp::Union => "UNION",
            SetOp::UnionAll => "UNION ALL",
            SetOp::Intersect => "INTERSECT",
            SetOp::Except => "EXCEPT",
        }
    }
}

#[derive(Clone, Debug)]
struct OrderTerm {
    column: String,
    direction: Option<&'static str>,
}

/// SELECT query builder.
#[derive(Clone, Debug)]
pub struct SelectStmt {
    ctes: CteList,
    distinct: bool,
    /// Empty means `*`.
    projection: Vec<SelectItem>,
    source: Source,
    joins: Vec<Join>,
    filters: Filters,
    group_by: Vec<String>,
    having: Filters,
    order_by: Vec<OrderTerm>,
    limit: Option<i64>,
    offset: Option<i64>,
    set_ops: Vec<(SetOp, SelectStmt)>,
}

impl SelectStmt {
    /// Create a new SELECT builder for a table (`users` or `users u`).
    pub fn new(table: &str) -> Self {
        Self::with_source(Source::Table {
            name: table.to_string(),
            alias: None,
        })
    }

    /// SELECT from a table with an alias: `FROM "users" AS "u"`.
    pub fn from_as(table: &str, alias: &str) -> Self {
        Self::with_source(Source::Table {
            name: table.to_string(),
            alias: Some(alias.to_string()),
        })
    }

    /// SELECT from a nested statement: `FROM (SELECT ...) AS "alias"`.
    ///
    /// The alias is mandatory and must be a single identifier.
    pub fn from_subquery(query: SelectStmt, alias: &str) -> SqlResult<Self> {
        Ok(Self::with_source(Source::Subquery {
            query: Box::new(query),
            alias: validate_alias(alias)?,
        }))
    }

    fn with_source(source: Source) -> Self {
        Self {
            ctes: CteList::new(),
            distinct: false,
            projection: Vec::new(),
            source,
            joins: Vec::new(),
            filters: Filters::new(),
            group_by: Vec::new(),
            having: Filters::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            set_ops: Vec::new(),
        }
    }

    /// A statement without a source table has nothing to select from.
    pub fn is_empty(&self) -> bool {
        matches!(&self.source, Source::Table { name, .. } if name.trim().is_empty())
    }

    /// Whether this statement is `body UNION [ALL] ...`.
    pub fn is_union(&self) -> bool {
        matches!(
            self.set_ops.first(),
            Some((SetOp::Union | SetOp::UnionAll, _))
        )
    }

    // ==================== CTE ====================

    /// Add `WITH name AS (query)`.
    pub fn with(mut self, name: &str, query: SelectStmt) -> SqlResult<Self> {
        self.ctes.push(Cte::new(name, query)?);
        Ok(self)
    }

    /// Add `WITH name(columns...) AS (query)`.
    pub fn with_columns(mut self, name: &str, columns: &[&str], query: SelectStmt) -> SqlResult<Self> {
        self.ctes.push(Cte::new(name, query)?.columns(columns)?);
        Ok(self)
    }

    /// Add a recursive CTE; the prologue becomes `WITH RECURSIVE`.
    pub fn with_recursive(mut self, name: &str, query: SelectStmt) -> SqlResult<Self> {
        self.ctes.push(Cte::recursive(name, query)?);
        Ok(self)
    }

    pub fn with_cte(mut self, cte: Cte) -> Self {
        self.ctes.push(cte);
        self
    }

    // ==================== SELECT columns ====================

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Set SELECT columns (string form, supports complex expressions).
    pub fn select(mut self, cols: &str) -> Self {
        self.projection = vec![SelectItem::Column(cols.to_string())];
        self
    }

    /// Set SELECT columns (array form).
    pub fn select_cols(mut self, cols: &[&str]) -> Self {
        self.projection = cols
            .iter()
            .map(|c| SelectItem::Column(c.to_string()))
            .collect();
        self
    }

    /// Append one SELECT column.
    pub fn add_select(mut self, col: &str) -> Self {
        self.projection.push(SelectItem::Column(col.to_string()));
        self
    }

    /// Append a projected expression: `expr AS "alias"`.
    pub fn select_expr(mut self, term: impl Into<Term>, alias: &str) -> Self {
        self.projection.push(SelectItem::Term {
            term: term.into(),
            alias: Some(alias.to_string()),
        });
        self
    }

    // ==================== JOIN ====================

    pub fn join(mut self, kind: JoinKind, target: Source, on: Option<Expr>) -> Self {
        self.joins.push(Join { kind, target, on });
        self
    }

    fn join_table(self, kind: JoinKind, table: &str, on: Option<Expr>) -> Self {
        self.join(
            kind,
            Source::Table {
                name: table.to_string(),
                alias: None,
            },
            on,
        )
    }

    /// Add INNER JOIN.
    pub fn inner_join(self, table: &str, on: impl Into<Expr>) -> Self {
        self.join_table(JoinKind::Inner, table, Some(on.into()))
    }

    /// Add LEFT JOIN.
    pub fn left_join(self, table: &str, on: impl Into<Expr>) -> Self {
        self.join_table(JoinKind::Left, table, Some(on.into()))
    }

    /// Add RIGHT JOIN.
    pub fn right_join(self, table: &str, on: impl Into<Expr>) -> Self {
        self.join_table(JoinKind::Right, table, Some(on.into()))
    }

    /// Add FULL OUTER JOIN.
    pub fn full_join(self, table: &str, on: impl Into<Expr>) -> Self {
        self.join_table(JoinKind::Full, table, Some(on.into()))
    }

    /// Add CROSS JOIN.
    pub fn cross_join(self, table: &str) -> Self {
        self.join_table(JoinKind::Cross, table, None)
    }

    /// Join a nested statement: `KIND (SELECT ...) AS "alias" ON ...`.
    pub fn join_subquery(
        self,
        kind: JoinKind,
        query: SelectStmt,
        alias: &str,
        on: impl Into<Expr>,
    ) -> SqlResult<Self> {
        let target = Source::Subquery {
            query: Box::new(query),
            alias: validate_alias(alias)?,
        };
        Ok(self.join(kind, target, Some(on.into())))
    }

    // ==================== WHERE ====================

    /// Add a filter under implicit AND.
    pub fn where_(mut self, expr: impl Into<Expr>) -> Self {
        self.filters.push(expr.into());
        self
    }

    /// Same as [`SelectStmt::where_`].
    pub fn and_where(self, expr: impl Into<Expr>) -> Self {
        self.where_(expr)
    }

    /// `(everything so far) OR (expr)`.
    pub fn or_where(mut self, expr: impl Into<Expr>) -> Self {
        self.filters.or(expr.into());
        self
    }

    /// Raw filter with one value per `?`.
    pub fn where_raw(self, sql: &str, values: Vec<Value>) -> Self {
        self.where_(Expr::template(sql, values))
    }

    /// Filter from a dynamic JSON operand (raw text or column map).
    pub fn where_json(self, operand: serde_json::Value) -> SqlResult<Self> {
        Ok(self.where_(Expr::from_json(operand)?))
    }

    /// Add WHERE: column = value
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::eq(column, value))
    }

    /// Add WHERE: column <> value
    pub fn ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::ne(column, value))
    }

    /// Add WHERE: column > value
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::gt(column, value))
    }

    /// Add WHERE: column >= value
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::gte(column, value))
    }

    /// Add WHERE: column < value
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::lt(column, value))
    }

    /// Add WHERE: column <= value
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(Expr::lte(column, value))
    }

    /// Add WHERE: column IS NULL
    pub fn is_null(self, column: &str) -> Self {
        self.where_(Expr::is_null(column))
    }

    /// Add WHERE: column IS NOT NULL
    pub fn is_not_null(self, column: &str) -> Self {
        self.where_(Expr::is_not_null(column))
    }

    /// Add WHERE: column IN (values...)
    pub fn in_list<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_(Expr::in_list(column, values))
    }

    /// Add WHERE: column NOT IN (values...)
    pub fn not_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.where_(Expr::not_in(column, values))
    }

    /// Add WHERE: column BETWEEN low AND high
    pub fn between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.where_(Expr::between(column, low, high))
    }

    /// Add WHERE: column LIKE '%pattern%' (escaped)
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.where_(Expr::like(column, pattern))
    }

    /// Add a configured LIKE filter.
    pub fn like_with(self, like: LikeExpr) -> Self {
        self.where_(like)
    }

    /// Add WHERE: column = value, skipped when `value` is `None`.
    pub fn eq_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    // ==================== GROUP BY / HAVING ====================

    pub fn group_by(mut self, cols: &[&str]) -> Self {
        self.group_by.extend(cols.iter().map(|c| c.to_string()));
        self
    }

    /// Add a HAVING condition under implicit AND.
    pub fn having(mut self, expr: impl Into<Expr>) -> Self {
        self.having.push(expr.into());
        self
    }

    /// `(HAVING so far) OR (expr)`.
    pub fn or_having(mut self, expr: impl Into<Expr>) -> Self {
        self.having.or(expr.into());
        self
    }

    // ==================== ORDER / LIMIT ====================

    /// Add ORDER BY clause (verbatim unless it is a plain column).
    pub fn order_by(mut self, clause: &str) -> Self {
        self.order_by.push(OrderTerm {
            column: clause.to_string(),
            direction: None,
        });
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(mut self, column: &str) -> Self {
        self.order_by.push(OrderTerm {
            column: column.to_string(),
            direction: Some("ASC"),
        });
        self
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push(OrderTerm {
            column: column.to_string(),
            direction: Some("DESC"),
        });
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n.max(0));
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n.max(0));
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(mut self, page: i64, per_page: i64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit = Some(size);
        self.offset = Some((p - 1).saturating_mul(size));
        self
    }

    // ==================== Set operations ====================

    pub fn set_op(mut self, op: SetOp, other: SelectStmt) -> Self {
        self.set_ops.push((op, other));
        self
    }

    pub fn union(self, other: SelectStmt) -> Self {
        self.set_op(SetOp::Union, other)
    }

    pub fn union_all(self, other: SelectStmt) -> Self {
        self.set_op(SetOp::UnionAll, other)
    }

    pub fn intersect(self, other: SelectStmt) -> Self {
        self.set_op(SetOp::Intersect, other)
    }

    pub fn except(self, other: SelectStmt) -> Self {
        self.set_op(SetOp::Except, other)
    }

    // ==================== COUNT ====================

    /// A `COUNT(*)` version of this query, without ordering or paging.
    ///
    /// Grouped, DISTINCT and compound queries are wrapped as
    /// `SELECT COUNT(*) FROM (...) AS "t"` so the count covers result rows.
    pub fn count_query(&self) -> SelectStmt {
        let mut inner = self.clone();
        inner.order_by.clear();
        inner.limit = None;
        inner.offset = None;

        let needs_wrap = inner.distinct
            || !inner.group_by.is_empty()
            || !inner.having.is_empty()
            || !inner.set_ops.is_empty();
        if !needs_wrap {
            inner.projection = vec![SelectItem::Column("COUNT(*)".to_string())];
            return inner;
        }

        let ctes = std::mem::take(&mut inner.ctes);
        let mut outer = SelectStmt::with_source(Source::Subquery {
            query: Box::new(inner),
            alias: "t".to_string(),
        })
        .select("COUNT(*)");
        outer.ctes = ctes;
        outer
    }

    fn write_projection(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        if self.projection.is_empty() {
            w.push("*");
            return Ok(());
        }
        for (i, item) in self.projection.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match item {
                SelectItem::Column(col) => {
                    w.push_column(col);
                }
                SelectItem::Term { term, alias } => {
                    term.write(w)?;
                    if let Some(alias) = alias {
                        w.push(" AS ").push_name(alias);
                    }
                }
            }
        }
        Ok(())
    }
}

fn validate_alias(alias: &str) -> SqlResult<String> {
    if alias.trim().is_empty() {
        return Err(SqlError::InvalidIdentifier(
            "subquery alias cannot be empty".to_string(),
        ));
    }
    match Ident::parse(alias)?.parts.as_slice() {
        [IdentPart::Name(part)] => Ok(part.clone()),
        _ => Err(SqlError::InvalidIdentifier(format!(
            "subquery alias '{alias}' must be a single identifier"
        ))),
    }
}

impl SqlStmt for SelectStmt {
    fn kind(&self) -> &'static str {
        "select"
    }

    fn write_sql(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        self.ctes.write(w)?;

        w.push("SELECT ");
        if self.distinct {
            w.push("DISTINCT ");
        }
        self.write_projection(w)?;

        w.push(" FROM ");
        self.source.write(w)?;

        for join in &self.joins {
            w.push(" ").push(join.kind.as_str()).push(" ");
            join.target.write(w)?;
            if let Some(on) = &join.on {
                let mut sub = w.sub();
                on.write(&mut sub)?;
                if !sub.is_empty() {
                    w.push(" ON ").append(sub);
                }
            }
        }

        self.filters.write_prefixed(w, "WHERE")?;

        if !self.group_by.is_empty() {
            w.push(" GROUP BY ");
            write_column_list(w, &self.group_by);
        }

        self.having.write_prefixed(w, "HAVING")?;

        if !self.order_by.is_empty() {
            w.push(" ORDER BY ");
            for (i, term) in self.order_by.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push_column(&term.column);
                if let Some(direction) = term.direction {
                    w.push(" ").push(direction);
                }
            }
        }

        match (self.limit, self.offset) {
            (Some(limit), _) => {
                w.push(&format!(" LIMIT {limit}"));
            }
            (None, Some(_)) => {
                if let Some(unbounded) = w.dialect().unbounded_limit() {
                    w.push(" LIMIT ").push(unbounded);
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {offset}"));
        }

        for (op, rhs) in &self.set_ops {
            w.push(" ").push(op.as_str()).push(" ");
            rhs.write_sql(w)?;
        }
        Ok(())
    }
}
