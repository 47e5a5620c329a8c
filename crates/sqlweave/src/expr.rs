//! Composable boolean and value expressions.
//!
//! This module provides the `Expr` enum which supports:
//! - AND/OR/NOT grouping, with absent operands filtered out
//! - Comparisons, IN/NOT IN, BETWEEN and LIKE with escape handling
//! - EXISTS over nested statements
//! - Value functions (CASE, COALESCE, NULLIF, GREATEST/LEAST, concatenation)
//! - Raw SQL fragments with `?` markers
//!
//! Every variant writes dialect-neutral `?` markers and pushes its values in
//! the same order. Column names are quoted immediately; placeholder numbering
//! is left to the statement's final resolution pass.

use crate::config::LikeEscapes;
use crate::dialect::{ConcatStyle, Dialect};
use crate::error::{SqlError, SqlResult};
use crate::stmt::{SelectStmt, SqlStmt};
use crate::value::{Value, from_json_scalar};
use crate::writer::SqlWriter;
use std::collections::{BTreeMap, HashMap};

/// Always-false literal.
pub(crate) const FALSE: &str = "0=1";
/// Always-true literal.
pub(crate) const TRUE: &str = "1=1";

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Gte => ">=",
            CmpOp::Lte => "<=",
        }
    }
}

/// Which sides of a LIKE pattern receive a `%` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wildcard {
    /// Pattern is bound as given (after escaping).
    None,
    /// `%pattern`
    Left,
    /// `pattern%`
    Right,
    /// `%pattern%`
    #[default]
    Both,
}

impl Wildcard {
    fn apply(self, pattern: &str) -> String {
        match self {
            Wildcard::None => pattern.to_string(),
            Wildcard::Left => format!("%{pattern}"),
            Wildcard::Right => format!("{pattern}%"),
            Wildcard::Both => format!("%{pattern}%"),
        }
    }
}

/// An operand of a comparison or value function.
#[derive(Debug, Clone)]
pub enum Term {
    /// Column reference, quoted when it is a plain identifier.
    Column(String),
    /// Bound value.
    Value(Value),
    /// Nested expression, parenthesized unless it is a function call.
    Expr(Box<Expr>),
    /// Scalar subquery.
    Subquery(Box<SelectStmt>),
}

impl Term {
    pub fn col(name: impl Into<String>) -> Self {
        Term::Column(name.into())
    }

    pub fn val(value: impl Into<Value>) -> Self {
        Term::Value(value.into())
    }

    fn is_null(&self) -> bool {
        matches!(self, Term::Value(Value::Null))
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        match self {
            Term::Column(name) => {
                w.push_column(name);
            }
            Term::Value(value) => {
                w.push_bind(value.clone());
            }
            Term::Expr(expr) => {
                let mut sub = w.sub();
                expr.write(&mut sub)?;
                if sub.is_empty() {
                    sub.push(TRUE);
                }
                if expr.is_function() {
                    w.append(sub);
                } else {
                    w.append_wrapped(sub);
                }
            }
            Term::Subquery(query) => {
                let mut sub = w.sub();
                query.write_sql(&mut sub)?;
                w.append_wrapped(sub);
            }
        }
        Ok(())
    }

    /// Write without the grouping parentheses a nested expression would get.
    fn write_bare(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        match self {
            Term::Expr(expr) => {
                let mut sub = w.sub();
                expr.write(&mut sub)?;
                if sub.is_empty() {
                    sub.push(TRUE);
                }
                w.append(sub);
                Ok(())
            }
            other => other.write(w),
        }
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Value(value)
    }
}

impl From<Expr> for Term {
    fn from(expr: Expr) -> Self {
        Term::Expr(Box::new(expr))
    }
}

impl From<SelectStmt> for Term {
    fn from(query: SelectStmt) -> Self {
        Term::Subquery(Box::new(query))
    }
}

/// LIKE / NOT LIKE over one or more patterns.
#[derive(Debug, Clone)]
pub struct LikeExpr {
    column: String,
    patterns: Vec<String>,
    wildcard: Wildcard,
    escapes: LikeEscapes,
    negated: bool,
    any: bool,
}

impl LikeExpr {
    fn new(column: String, patterns: Vec<String>, any: bool) -> Self {
        Self {
            column,
            patterns,
            wildcard: Wildcard::default(),
            escapes: LikeEscapes::default(),
            negated: false,
            any,
        }
    }

    /// Set wildcard placement (default: both sides).
    pub fn wildcard(mut self, wildcard: Wildcard) -> Self {
        self.wildcard = wildcard;
        self
    }

    /// Replace the escape pairs applied before wildcards are added.
    pub fn escapes(mut self, escapes: LikeEscapes) -> Self {
        self.escapes = escapes;
        self
    }

    /// Render `NOT LIKE`.
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    fn write(&self, w: &mut SqlWriter<'_>) {
        if self.patterns.is_empty() {
            // OR over nothing is false; AND over nothing is omitted.
            if self.any {
                w.push(FALSE);
            }
            return;
        }

        let op = if self.negated { " NOT LIKE " } else { " LIKE " };
        let dialect_escape = w.dialect().default_like_escape();
        let escape_clause = self
            .escapes
            .escape_char()
            .filter(|&c| dialect_escape != Some(c))
            .map(escape_clause);
        let multi = self.patterns.len() > 1;
        let joiner = if self.any { " OR " } else { " AND " };

        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                w.push(joiner);
            }
            if multi {
                w.push("(");
            }
            let bound = self.wildcard.apply(&self.escapes.apply(pattern));
            w.push_column(&self.column).push(op).push_bind(Value::Text(bound));
            if let Some(clause) = &escape_clause {
                w.push(clause);
            }
            if multi {
                w.push(")");
            }
        }
    }
}

fn escape_clause(c: char) -> String {
    let quoted = if c == '\'' { "''".to_string() } else { c.to_string() };
    format!(" ESCAPE '{quoted}'")
}

impl From<LikeExpr> for Expr {
    fn from(like: LikeExpr) -> Self {
        Expr::Like(like)
    }
}

/// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`
#[derive(Debug, Clone, Default)]
pub struct CaseExpr {
    operand: Option<Term>,
    whens: Vec<(Term, Term)>,
    otherwise: Option<Term>,
}

impl CaseExpr {
    /// Compare each WHEN against `operand` (simple CASE).
    pub fn operand(mut self, operand: impl Into<Term>) -> Self {
        self.operand = Some(operand.into());
        self
    }

    pub fn when(mut self, condition: impl Into<Term>, result: impl Into<Term>) -> Self {
        self.whens.push((condition.into(), result.into()));
        self
    }

    pub fn otherwise(mut self, result: impl Into<Term>) -> Self {
        self.otherwise = Some(result.into());
        self
    }

    fn write(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        if self.whens.is_empty() {
            return match &self.otherwise {
                Some(term) => term.write(w),
                None => {
                    w.push("NULL");
                    Ok(())
                }
            };
        }
        w.push("CASE");
        if let Some(operand) = &self.operand {
            w.push(" ");
            operand.write(w)?;
        }
        for (condition, result) in &self.whens {
            w.push(" WHEN ");
            condition.write_bare(w)?;
            w.push(" THEN ");
            result.write(w)?;
        }
        if let Some(otherwise) = &self.otherwise {
            w.push(" ELSE ");
            otherwise.write(w)?;
        }
        w.push(" END");
        Ok(())
    }
}

impl From<CaseExpr> for Expr {
    fn from(case: CaseExpr) -> Self {
        Expr::Case(case)
    }
}

/// Operand of EXISTS.
#[derive(Debug, Clone)]
pub enum ExistsOperand {
    Query(Box<SelectStmt>),
    Expr(Box<Expr>),
}

/// Expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Verbatim SQL whose `?` markers are satisfied by `values`.
    Raw { sql: String, values: Vec<Value> },

    /// Column equality map, rendered in sorted key order.
    EqMap(BTreeMap<String, Value>),

    /// `left op right`; a NULL right side becomes `IS [NOT] NULL`.
    Compare { left: Term, op: CmpOp, right: Term },

    /// IN list: column IN (?, ?, ...) or column NOT IN (...)
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },

    /// column [NOT] IN (subquery)
    InSubquery {
        column: String,
        query: Box<SelectStmt>,
        negated: bool,
    },

    /// column [NOT] BETWEEN ? AND ?
    Between {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },

    Like(LikeExpr),

    /// AND group: each operand parenthesized when more than one remains.
    And(Vec<Expr>),

    /// OR group: each operand parenthesized when more than one remains.
    Or(Vec<Expr>),

    /// Implicit conjunction of a WHERE/HAVING filter list.
    Clause(Vec<Expr>),

    Not(Box<Expr>),

    /// [NOT] EXISTS; an absent or empty operand becomes a constant.
    Exists {
        operand: Option<ExistsOperand>,
        negated: bool,
    },

    Case(CaseExpr),
    Coalesce(Vec<Term>),
    NullIf(Term, Term),
    Greatest(Vec<Term>),
    Least(Vec<Term>),
    Concat(Vec<Term>),
}

impl Expr {
    // ==================== Raw ====================

    /// Raw SQL fragment without values.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    /// Raw SQL with one value per `?` marker.
    ///
    /// The marker count is checked when the expression is rendered.
    pub fn template(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Expr::Raw {
            sql: sql.into(),
            values,
        }
    }

    /// Column equality map.
    pub fn eq_map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Expr::EqMap(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Dynamic filter operand: a JSON string is raw SQL, a JSON object is
    /// an equality map. Anything else is rejected.
    pub fn from_json(value: serde_json::Value) -> SqlResult<Self> {
        match value {
            serde_json::Value::String(sql) => Ok(Expr::raw(sql)),
            serde_json::Value::Object(map) => Ok(Expr::EqMap(
                map.into_iter()
                    .map(|(k, v)| (k, from_json_scalar(v)))
                    .collect(),
            )),
            other => Err(SqlError::unsupported_operand(format!(
                "expected raw SQL text or a column map, got {}",
                json_kind(&other)
            ))),
        }
    }

    // ==================== Comparisons ====================

    pub fn compare(left: impl Into<Term>, op: CmpOp, right: impl Into<Term>) -> Self {
        Expr::Compare {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    fn column_cmp(column: impl Into<String>, op: CmpOp, value: impl Into<Value>) -> Self {
        Expr::Compare {
            left: Term::Column(column.into()),
            op,
            right: Term::Value(value.into()),
        }
    }

    /// column = value
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::column_cmp(column, CmpOp::Eq, value)
    }

    /// column <> value
    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::column_cmp(column, CmpOp::Ne, value)
    }

    /// column > value
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::column_cmp(column, CmpOp::Gt, value)
    }

    /// column >= value
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::column_cmp(column, CmpOp::Gte, value)
    }

    /// column < value
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::column_cmp(column, CmpOp::Lt, value)
    }

    /// column <= value
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::column_cmp(column, CmpOp::Lte, value)
    }

    /// column IS NULL
    pub fn is_null(column: impl Into<String>) -> Self {
        Self::column_cmp(column, CmpOp::Eq, Value::Null)
    }

    /// column IS NOT NULL
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::column_cmp(column, CmpOp::Ne, Value::Null)
    }

    /// column IN (values...)
    pub fn in_list<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Expr::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// column NOT IN (values...)
    pub fn not_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Expr::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    pub fn in_subquery(column: impl Into<String>, query: SelectStmt) -> Self {
        Expr::InSubquery {
            column: column.into(),
            query: Box::new(query),
            negated: false,
        }
    }

    pub fn not_in_subquery(column: impl Into<String>, query: SelectStmt) -> Self {
        Expr::InSubquery {
            column: column.into(),
            query: Box::new(query),
            negated: true,
        }
    }

    /// column BETWEEN low AND high
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: false,
        }
    }

    /// column NOT BETWEEN low AND high
    pub fn not_between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
            negated: true,
        }
    }

    // ==================== LIKE ====================

    /// column LIKE '%pattern%' with the default escapes.
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> LikeExpr {
        LikeExpr::new(column.into(), vec![pattern.into()], true)
    }

    /// column NOT LIKE '%pattern%'
    pub fn not_like(column: impl Into<String>, pattern: impl Into<String>) -> LikeExpr {
        Self::like(column, pattern).negate()
    }

    /// Match any of `patterns` (OR).
    pub fn like_any<P: Into<String>>(
        column: impl Into<String>,
        patterns: impl IntoIterator<Item = P>,
    ) -> LikeExpr {
        LikeExpr::new(
            column.into(),
            patterns.into_iter().map(Into::into).collect(),
            true,
        )
    }

    /// Match all of `patterns` (AND).
    pub fn like_all<P: Into<String>>(
        column: impl Into<String>,
        patterns: impl IntoIterator<Item = P>,
    ) -> LikeExpr {
        LikeExpr::new(
            column.into(),
            patterns.into_iter().map(Into::into).collect(),
            false,
        )
    }

    // ==================== Grouping ====================

    pub fn and(exprs: Vec<Expr>) -> Self {
        Expr::And(exprs)
    }

    pub fn or(exprs: Vec<Expr>) -> Self {
        Expr::Or(exprs)
    }

    /// AND over optional operands; `None` entries are dropped.
    pub fn and_opt(exprs: impl IntoIterator<Item = Option<Expr>>) -> Self {
        Expr::And(exprs.into_iter().flatten().collect())
    }

    /// OR over optional operands; `None` entries are dropped.
    pub fn or_opt(exprs: impl IntoIterator<Item = Option<Expr>>) -> Self {
        Expr::Or(exprs.into_iter().flatten().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    // ==================== EXISTS ====================

    pub fn exists(query: SelectStmt) -> Self {
        Expr::Exists {
            operand: Some(ExistsOperand::Query(Box::new(query))),
            negated: false,
        }
    }

    pub fn not_exists(query: SelectStmt) -> Self {
        Expr::Exists {
            operand: Some(ExistsOperand::Query(Box::new(query))),
            negated: true,
        }
    }

    /// EXISTS over an optional statement; `None` renders `0=1`.
    pub fn exists_opt(query: Option<SelectStmt>) -> Self {
        Expr::Exists {
            operand: query.map(|q| ExistsOperand::Query(Box::new(q))),
            negated: false,
        }
    }

    /// EXISTS over a raw expression such as `SELECT 1 FROM t WHERE ...`.
    pub fn exists_expr(expr: Expr) -> Self {
        Expr::Exists {
            operand: Some(ExistsOperand::Expr(Box::new(expr))),
            negated: false,
        }
    }

    // ==================== Value functions ====================

    pub fn case() -> CaseExpr {
        CaseExpr::default()
    }

    pub fn coalesce<T: Into<Term>>(terms: impl IntoIterator<Item = T>) -> Self {
        Expr::Coalesce(terms.into_iter().map(Into::into).collect())
    }

    pub fn nullif(a: impl Into<Term>, b: impl Into<Term>) -> Self {
        Expr::NullIf(a.into(), b.into())
    }

    pub fn greatest<T: Into<Term>>(terms: impl IntoIterator<Item = T>) -> Self {
        Expr::Greatest(terms.into_iter().map(Into::into).collect())
    }

    pub fn least<T: Into<Term>>(terms: impl IntoIterator<Item = T>) -> Self {
        Expr::Least(terms.into_iter().map(Into::into).collect())
    }

    pub fn concat<T: Into<Term>>(terms: impl IntoIterator<Item = T>) -> Self {
        Expr::Concat(terms.into_iter().map(Into::into).collect())
    }

    // ==================== Rendering ====================

    /// Render to a neutral fragment (`?` markers) and its values.
    pub fn render(&self, dialect: &dyn Dialect) -> SqlResult<(String, Vec<Value>)> {
        let mut w = SqlWriter::new(dialect);
        self.write(&mut w)?;
        Ok(w.into_parts())
    }

    /// Function-call forms read as a single operand and need no grouping.
    fn is_function(&self) -> bool {
        matches!(
            self,
            Expr::Raw { .. }
                | Expr::Case(_)
                | Expr::Coalesce(_)
                | Expr::NullIf(..)
                | Expr::Greatest(_)
                | Expr::Least(_)
                | Expr::Concat(_)
        )
    }

    /// Whether this entry needs parentheses inside an AND-joined clause.
    fn needs_group(&self) -> bool {
        match self {
            Expr::Or(_) => true,
            Expr::Raw { sql, .. } => has_top_level_or(sql),
            Expr::Like(like) => like.patterns.len() > 1 && like.any,
            _ => false,
        }
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        match self {
            Expr::Raw { sql, values } => {
                w.push_raw(sql, values)?;
            }
            Expr::EqMap(map) => {
                for (i, (column, value)) in map.iter().enumerate() {
                    if i > 0 {
                        w.push(" AND ");
                    }
                    w.push_column(column);
                    if value.is_null() {
                        w.push(" IS NULL");
                    } else {
                        w.push(" = ").push_bind(value.clone());
                    }
                }
            }
            Expr::Compare { left, op, right } => {
                left.write(w)?;
                match (op, right.is_null()) {
                    (CmpOp::Eq, true) => {
                        w.push(" IS NULL");
                    }
                    (CmpOp::Ne, true) => {
                        w.push(" IS NOT NULL");
                    }
                    _ => {
                        w.push(" ").push(op.as_str()).push(" ");
                        right.write(w)?;
                    }
                }
            }
            Expr::In {
                column,
                values,
                negated,
            } => write_in(w, column, values, *negated),
            Expr::InSubquery {
                column,
                query,
                negated,
            } => {
                let mut sub = w.sub();
                query.write_sql(&mut sub)?;
                w.push_column(column)
                    .push(if *negated { " NOT IN " } else { " IN " })
                    .append_wrapped(sub);
            }
            Expr::Between {
                column,
                low,
                high,
                negated,
            } => {
                w.push_column(column)
                    .push(if *negated { " NOT BETWEEN " } else { " BETWEEN " })
                    .push_bind(low.clone())
                    .push(" AND ")
                    .push_bind(high.clone());
            }
            Expr::Like(like) => like.write(w),
            Expr::And(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    let mut sub = w.sub();
                    item.write(&mut sub)?;
                    if !sub.is_empty() {
                        parts.push(sub);
                    }
                }
                write_joined(w, parts, " AND ");
            }
            Expr::Or(items) => {
                if items.is_empty() {
                    w.push(FALSE);
                    return Ok(());
                }
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    let mut sub = w.sub();
                    item.write(&mut sub)?;
                    // An empty operand is always true, and so is the group.
                    if sub.is_empty() {
                        return Ok(());
                    }
                    parts.push(sub);
                }
                write_joined(w, parts, " OR ");
            }
            Expr::Clause(items) => write_clause(w, items)?,
            Expr::Not(inner) => {
                let mut sub = w.sub();
                inner.write(&mut sub)?;
                if sub.is_empty() {
                    w.push(FALSE);
                } else {
                    w.push("NOT ").append_wrapped(sub);
                }
            }
            Expr::Exists { operand, negated } => {
                let mut sub = w.sub();
                match operand {
                    Some(ExistsOperand::Query(query)) if !query.is_empty() => {
                        query.write_sql(&mut sub)?;
                    }
                    Some(ExistsOperand::Expr(expr)) => expr.write(&mut sub)?,
                    _ => {}
                }
                if sub.is_empty() {
                    w.push(if *negated { TRUE } else { FALSE });
                } else {
                    w.push(if *negated { "NOT EXISTS " } else { "EXISTS " })
                        .append_wrapped(sub);
                }
            }
            Expr::Case(case) => case.write(w)?,
            Expr::Coalesce(terms) => write_function(w, "COALESCE", terms)?,
            Expr::NullIf(a, b) => {
                w.push("NULLIF(");
                a.write(w)?;
                w.push(", ");
                b.write(w)?;
                w.push(")");
            }
            Expr::Greatest(terms) => {
                let name = if w.dialect().supports_greatest_least() {
                    "GREATEST"
                } else {
                    "MAX"
                };
                write_extremum(w, name, terms)?;
            }
            Expr::Least(terms) => {
                let name = if w.dialect().supports_greatest_least() {
                    "LEAST"
                } else {
                    "MIN"
                };
                write_extremum(w, name, terms)?;
            }
            Expr::Concat(terms) => match terms.as_slice() {
                [] => {
                    w.push("''");
                }
                [only] => only.write(w)?,
                _ => match w.dialect().concat_style() {
                    ConcatStyle::Function => write_function(w, "CONCAT", terms)?,
                    ConcatStyle::Operator => {
                        for (i, term) in terms.iter().enumerate() {
                            if i > 0 {
                                w.push(" || ");
                            }
                            term.write(w)?;
                        }
                    }
                },
            },
        }
        Ok(())
    }
}

/// Write `items` joined by AND, grouping OR entries when more than one remains.
pub(crate) fn write_clause(w: &mut SqlWriter<'_>, items: &[Expr]) -> SqlResult<()> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        let mut sub = w.sub();
        item.write(&mut sub)?;
        if !sub.is_empty() {
            parts.push((item.needs_group(), sub));
        }
    }
    let multi = parts.len() > 1;
    for (i, (group, sub)) in parts.into_iter().enumerate() {
        if i > 0 {
            w.push(" AND ");
        }
        if multi && group {
            w.append_wrapped(sub);
        } else {
            w.append(sub);
        }
    }
    Ok(())
}

fn write_in(w: &mut SqlWriter<'_>, column: &str, values: &[Value], negated: bool) {
    match values {
        [] => {
            // NOT IN () excludes nothing, so it is left out entirely.
            if !negated {
                w.push(FALSE);
            }
        }
        [only] if only.is_null() => {
            w.push_column(column)
                .push(if negated { " IS NOT NULL" } else { " IS NULL" });
        }
        [only] => {
            w.push_column(column)
                .push(if negated { " <> " } else { " = " })
                .push_bind(only.clone());
        }
        _ => {
            w.push_column(column)
                .push(if negated { " NOT IN (" } else { " IN (" });
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                if value.is_null() {
                    w.push("NULL");
                } else {
                    w.push_bind(value.clone());
                }
            }
            w.push(")");
        }
    }
}

fn write_joined(w: &mut SqlWriter<'_>, mut parts: Vec<SqlWriter<'_>>, sep: &str) {
    if parts.len() == 1 {
        if let Some(only) = parts.pop() {
            w.append(only);
        }
        return;
    }
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            w.push(sep);
        }
        w.append_wrapped(part);
    }
}

fn write_function(w: &mut SqlWriter<'_>, name: &str, terms: &[Term]) -> SqlResult<()> {
    if terms.is_empty() {
        w.push("NULL");
        return Ok(());
    }
    w.push(name).push("(");
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        term.write(w)?;
    }
    w.push(")");
    Ok(())
}

fn write_extremum(w: &mut SqlWriter<'_>, name: &str, terms: &[Term]) -> SqlResult<()> {
    match terms {
        [only] => only.write(w),
        _ => write_function(w, name, terms),
    }
}

/// Whether raw SQL has an `OR` outside parentheses and quotes.
fn has_top_level_or(sql: &str) -> bool {
    let bytes = sql.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b'o' | b'O' if depth == 0 => {
                    let is_word = |c: u8| c == b'_' || c.is_ascii_alphanumeric();
                    let before = i == 0 || !is_word(bytes[i - 1]);
                    let next = bytes.get(i + 1).copied();
                    let after = bytes.get(i + 2).is_none_or(|&c| !is_word(c));
                    if before && matches!(next, Some(b'r' | b'R')) && after {
                        return true;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    false
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl From<&str> for Expr {
    fn from(sql: &str) -> Self {
        Expr::raw(sql)
    }
}

impl From<String> for Expr {
    fn from(sql: String) -> Self {
        Expr::raw(sql)
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Expr {
    fn from(map: BTreeMap<K, V>) -> Self {
        Expr::eq_map(map)
    }
}

impl<K: Into<String>, V: Into<Value>, S> From<HashMap<K, V, S>> for Expr {
    fn from(map: HashMap<K, V, S>) -> Self {
        Expr::eq_map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres, Sqlite};
    use crate::stmt::select;

    fn pg(expr: &Expr) -> (String, Vec<Value>) {
        expr.render(&Postgres).unwrap()
    }

    #[test]
    fn eq_map_sorts_keys() {
        let mut map = HashMap::new();
        map.insert("b", Value::Int(2));
        map.insert("a", Value::Int(1));
        map.insert("c", Value::Null);
        let (sql, args) = pg(&Expr::from(map));
        assert_eq!(sql, r#""a" = ? AND "b" = ? AND "c" IS NULL"#);
        assert_eq!(args, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn compare_with_null_becomes_is_null() {
        assert_eq!(pg(&Expr::eq("deleted_at", Value::Null)).0, r#""deleted_at" IS NULL"#);
        assert_eq!(pg(&Expr::is_not_null("x")).0, r#""x" IS NOT NULL"#);
        let (sql, args) = pg(&Expr::gt("age", 18i32));
        assert_eq!(sql, r#""age" > ?"#);
        assert_eq!(args, vec![Value::Int(18)]);
    }

    #[test]
    fn in_list_degenerate_forms() {
        let empty: Vec<i64> = Vec::new();
        assert_eq!(pg(&Expr::in_list("id", empty.clone())), ("0=1".to_string(), vec![]));
        assert_eq!(pg(&Expr::not_in("id", empty)), (String::new(), vec![]));
        assert_eq!(pg(&Expr::in_list("id", [7i64])).0, r#""id" = ?"#);
        assert_eq!(pg(&Expr::not_in("id", [7i64])).0, r#""id" <> ?"#);
        assert_eq!(
            pg(&Expr::in_list("id", [Value::Null])),
            (r#""id" IS NULL"#.to_string(), vec![])
        );
        let (sql, args) = pg(&Expr::in_list("id", [Value::Int(1), Value::Null, Value::Int(3)]));
        assert_eq!(sql, r#""id" IN (?, NULL, ?)"#);
        assert_eq!(args, vec![Value::Int(1), Value::Int(3)]);
    }

    #[test]
    fn and_or_wrap_only_when_needed() {
        let single = Expr::and_opt([None, Some(Expr::eq("a", 1i32))]);
        assert_eq!(pg(&single).0, r#""a" = ?"#);

        let both = Expr::or(vec![Expr::eq("a", 1i32), Expr::eq("b", 2i32)]);
        assert_eq!(pg(&both).0, r#"("a" = ?) OR ("b" = ?)"#);

        assert_eq!(pg(&Expr::and(vec![])).0, "");
        assert_eq!(pg(&Expr::or(vec![])).0, "0=1");
        assert_eq!(pg(&Expr::not(Expr::and(vec![]))).0, "0=1");
        assert_eq!(pg(&Expr::not(Expr::eq("a", 1i32))).0, r#"NOT ("a" = ?)"#);
    }

    #[test]
    fn or_with_always_true_operand_is_empty() {
        let expr = Expr::or(vec![Expr::eq("a", 1i32), Expr::not_in("b", Vec::<i64>::new())]);
        assert_eq!(pg(&expr), (String::new(), vec![]));
    }

    #[test]
    fn like_escapes_before_wildcards() {
        let (sql, args) = pg(&Expr::like("name", "50%_off").into());
        assert_eq!(sql, r#""name" LIKE ?"#);
        assert_eq!(args, vec![Value::Text(r"%50\%\_off%".to_string())]);

        let expr: Expr = Expr::like("name", "a%")
            .wildcard(Wildcard::Right)
            .escapes(LikeEscapes::none())
            .into();
        assert_eq!(pg(&expr).1, vec![Value::Text("a%%".to_string())]);
    }

    #[test]
    fn like_escape_clause_per_dialect() {
        let expr: Expr = Expr::like("name", "x").into();
        assert_eq!(expr.render(&Sqlite).unwrap().0, r#""name" LIKE ? ESCAPE '\'"#);
        let plain: Expr = Expr::like("name", "x").escapes(LikeEscapes::none()).into();
        assert_eq!(plain.render(&Sqlite).unwrap().0, r#""name" LIKE ?"#);
    }

    #[test]
    fn like_escape_clause_follows_custom_escapes() {
        let bang = LikeEscapes(vec![
            ("!".to_string(), "!!".to_string()),
            ("%".to_string(), "!%".to_string()),
            ("_".to_string(), "!_".to_string()),
        ]);
        let expr: Expr = Expr::like("name", "50%").escapes(bang).into();

        let (sql, args) = expr.render(&Sqlite).unwrap();
        assert_eq!(sql, r#""name" LIKE ? ESCAPE '!'"#);
        assert_eq!(args, vec![Value::Text("%50!%%".to_string())]);
        // Backslash is the default on these, so only a different character needs the clause.
        assert_eq!(pg(&expr).0, r#""name" LIKE ? ESCAPE '!'"#);
        assert_eq!(expr.render(&MySql).unwrap().0, "`name` LIKE ? ESCAPE '!'");

        let default: Expr = Expr::like("name", "x").into();
        assert_eq!(pg(&default).0, r#""name" LIKE ?"#);
    }

    #[test]
    fn like_multiple_patterns() {
        let any: Expr = Expr::like_any("t", ["a", "b"]).into();
        assert_eq!(pg(&any).0, r#"("t" LIKE ?) OR ("t" LIKE ?)"#);
        let all: Expr = Expr::like_all("t", ["a", "b"]).negate().into();
        assert_eq!(pg(&all).0, r#"("t" NOT LIKE ?) AND ("t" NOT LIKE ?)"#);
        let none: Expr = Expr::like_any("t", Vec::<String>::new()).into();
        assert_eq!(pg(&none), ("0=1".to_string(), vec![]));
        let every: Expr = Expr::like_all("t", Vec::<String>::new()).into();
        assert_eq!(pg(&every).0, "");

        let sql = select("t")
            .like_with(Expr::like_any("name", Vec::<String>::new()))
            .to_sql(&Postgres)
            .unwrap();
        assert_eq!(sql, r#"SELECT * FROM "t" WHERE 0=1"#);
    }

    #[test]
    fn raw_or_is_grouped_in_conjunction() {
        let sql = select("t")
            .where_("a = 1 OR b = 2")
            .where_("c = 3")
            .to_sql(&Postgres)
            .unwrap();
        assert_eq!(sql, r#"SELECT * FROM "t" WHERE (a = 1 OR b = 2) AND c = 3"#);

        assert!(has_top_level_or("x = 1 or y = 2"));
        assert!(!has_top_level_or("(x = 1 OR y = 2)"));
        assert!(!has_top_level_or("name = 'this OR that'"));
        assert!(!has_top_level_or("color = 1 AND orders > 2"));
        // A lone raw filter is left as written.
        let sql = select("t").where_("a = 1 OR b = 2").to_sql(&Postgres).unwrap();
        assert_eq!(sql, r#"SELECT * FROM "t" WHERE a = 1 OR b = 2"#);
    }

    #[test]
    fn exists_degenerates_to_constants() {
        assert_eq!(pg(&Expr::exists_opt(None)).0, "0=1");
        let not_exists = Expr::Exists {
            operand: None,
            negated: true,
        };
        assert_eq!(pg(&not_exists).0, "1=1");

        let sub = select("orders").select_cols(&["1"]).eq("user_id", 5i64);
        let (sql, args) = pg(&Expr::exists(sub));
        assert_eq!(sql, r#"EXISTS (SELECT 1 FROM "orders" WHERE "user_id" = ?)"#);
        assert_eq!(args, vec![Value::Int(5)]);
    }

    #[test]
    fn case_and_coalesce() {
        let case: Expr = Expr::case()
            .when(Expr::gt("score", 90i32), Term::val("A"))
            .when(Expr::gt("score", 75i32), Term::val("B"))
            .otherwise(Term::val("C"))
            .into();
        let (sql, args) = pg(&case);
        assert_eq!(
            sql,
            r#"CASE WHEN "score" > ? THEN ? WHEN "score" > ? THEN ? ELSE ? END"#
        );
        assert_eq!(args.len(), 5);
        assert_eq!(args[0], Value::Int(90));
        assert_eq!(args[1], Value::Text("A".into()));

        let coalesce = Expr::coalesce([Term::col("nickname"), Term::val("anon")]);
        assert_eq!(pg(&coalesce).0, r#"COALESCE("nickname", ?)"#);

        let nullif = Expr::nullif(Term::col("a"), Term::val(0i32));
        assert_eq!(pg(&nullif).0, r#"NULLIF("a", ?)"#);
    }

    #[test]
    fn greatest_falls_back_to_max() {
        let expr = Expr::greatest([Term::col("a"), Term::col("b")]);
        assert_eq!(expr.render(&Postgres).unwrap().0, r#"GREATEST("a", "b")"#);
        assert_eq!(expr.render(&Sqlite).unwrap().0, r#"MAX("a", "b")"#);
        let least = Expr::least([Term::col("a"), Term::col("b")]);
        assert_eq!(least.render(&Sqlite).unwrap().0, r#"MIN("a", "b")"#);
        assert_eq!(Expr::greatest([Term::col("a")]).render(&Sqlite).unwrap().0, r#""a""#);
    }

    #[test]
    fn concat_operator_or_function() {
        let expr = Expr::concat([Term::col("first"), Term::val(" "), Term::col("last")]);
        assert_eq!(expr.render(&Postgres).unwrap().0, r#""first" || ? || "last""#);
        assert_eq!(expr.render(&MySql).unwrap().0, "CONCAT(`first`, ?, `last`)");
        assert_eq!(Expr::concat(Vec::<Term>::new()).render(&MySql).unwrap().0, "''");
    }

    #[test]
    fn function_terms_compare_without_parens() {
        let expr = Expr::compare(
            Expr::coalesce([Term::col("a"), Term::val(0i32)]),
            CmpOp::Gte,
            Term::val(10i32),
        );
        let (sql, args) = pg(&expr);
        assert_eq!(sql, r#"COALESCE("a", ?) >= ?"#);
        assert_eq!(args, vec![Value::Int(0), Value::Int(10)]);
    }

    #[test]
    fn from_json_operands() {
        let raw = Expr::from_json(serde_json::json!("a = 1")).unwrap();
        assert_eq!(pg(&raw).0, "a = 1");

        let map = Expr::from_json(serde_json::json!({"status": "active", "id": 3})).unwrap();
        let (sql, args) = pg(&map);
        assert_eq!(sql, r#""id" = ? AND "status" = ?"#);
        assert_eq!(args, vec![Value::Int(3), Value::Text("active".into())]);

        let err = Expr::from_json(serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, SqlError::UnsupportedOperand(_)));
        assert!(Expr::from_json(serde_json::json!(42)).is_err());
    }

    #[test]
    fn template_checks_marker_count() {
        let bad = Expr::template("a = ? OR b = ?", vec![Value::Int(1)]);
        assert!(matches!(
            bad.render(&Postgres),
            Err(SqlError::PlaceholderMismatch { markers: 2, args: 1 })
        ));
    }
}
