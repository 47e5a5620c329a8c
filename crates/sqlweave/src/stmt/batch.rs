//! Multi-row INSERT and CASE-based multi-row UPDATE.

use crate::dialect::UpsertStyle;
use crate::error::{SqlError, SqlResult};
use crate::stmt::{SqlStmt, write_column_list, write_returning};
use crate::value::Value;
use crate::writer::SqlWriter;
use std::collections::{BTreeMap, BTreeSet};

/// `INSERT INTO t (cols) VALUES (...), (...)`.
#[derive(Clone, Debug)]
pub struct BatchInsertStmt {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    returning: Vec<String>,
    do_nothing: bool,
}

impl BatchInsertStmt {
    pub fn new(table: &str, columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            returning: Vec::new(),
            do_nothing: false,
        }
    }

    /// Append a row; its length must match the column list.
    pub fn row(mut self, values: Vec<Value>) -> SqlResult<Self> {
        if values.len() != self.columns.len() {
            return Err(SqlError::RowArity {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        self.rows.push(values);
        Ok(self)
    }

    /// Append several rows, stopping at the first malformed one.
    pub fn rows(self, rows: impl IntoIterator<Item = Vec<Value>>) -> SqlResult<Self> {
        rows.into_iter().try_fold(self, |stmt, row| stmt.row(row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn on_conflict_do_nothing(mut self) -> Self {
        self.do_nothing = true;
        self
    }

    pub fn returning(mut self, cols: &[&str]) -> Self {
        self.returning = cols.iter().map(|c| c.to_string()).collect();
        self
    }
}

impl SqlStmt for BatchInsertStmt {
    fn kind(&self) -> &'static str {
        "batch_insert"
    }

    fn write_sql(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        if self.columns.is_empty() {
            return Err(SqlError::NoAssignments(self.table.clone()));
        }
        if self.rows.is_empty() {
            return Err(SqlError::EmptyBatch(self.table.clone()));
        }
        let style = w.dialect().upsert_style();

        if self.do_nothing && style == UpsertStyle::OnDuplicateKey {
            w.push("INSERT IGNORE INTO ");
        } else {
            w.push("INSERT INTO ");
        }
        w.push_column(&self.table).push(" (");
        write_column_list(w, &self.columns);
        w.push(") VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push("(").push_bind_list(row.iter().cloned()).push(")");
        }

        if self.do_nothing && style == UpsertStyle::OnConflict {
            w.push(" ON CONFLICT DO NOTHING");
        }
        write_returning(w, &self.returning)
    }
}

/// Multi-row UPDATE keyed by an identifier column:
///
/// ```text
/// UPDATE t SET a = CASE id WHEN ? THEN ? ... ELSE a END, ...
/// WHERE id IN (?, ...)
/// ```
///
/// Each CASE covers only the rows that set that column; other rows keep
/// their current value through the ELSE branch.
#[derive(Clone, Debug)]
pub struct BatchUpdateStmt {
    table: String,
    key: String,
    rows: Vec<(Value, BTreeMap<String, Value>)>,
}

impl BatchUpdateStmt {
    pub fn new(table: &str, key_column: &str) -> Self {
        Self {
            table: table.to_string(),
            key: key_column.to_string(),
            rows: Vec::new(),
        }
    }

    /// Append a row identified by `id`.
    pub fn row<K, V>(
        mut self,
        id: impl Into<Value>,
        assignments: impl IntoIterator<Item = (K, V)>,
    ) -> SqlResult<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let assignments: BTreeMap<String, Value> = assignments
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if assignments.is_empty() {
            return Err(SqlError::EmptyRow {
                row: self.rows.len(),
            });
        }
        self.rows.push((id.into(), assignments));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl SqlStmt for BatchUpdateStmt {
    fn kind(&self) -> &'static str {
        "batch_update"
    }

    fn write_sql(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        if self.rows.is_empty() {
            return Err(SqlError::EmptyBatch(self.table.clone()));
        }
        let columns: BTreeSet<&String> = self.rows.iter().flat_map(|(_, set)| set.keys()).collect();

        w.push("UPDATE ").push_column(&self.table).push(" SET ");
        for (i, column) in columns.into_iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push_column(column)
                .push(" = CASE ")
                .push_column(&self.key);
            for (id, set) in &self.rows {
                if let Some(value) = set.get(column) {
                    w.push(" WHEN ")
                        .push_bind(id.clone())
                        .push(" THEN ")
                        .push_bind(value.clone());
                }
            }
            w.push(" ELSE ").push_column(column).push(" END");
        }

        w.push(" WHERE ")
            .push_column(&self.key)
            .push(" IN (")
            .push_bind_list(self.rows.iter().map(|(id, _)| id.clone()))
            .push(")");
        Ok(())
    }
}
