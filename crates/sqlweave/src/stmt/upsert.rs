//! INSERT ... ON CONFLICT / ON DUPLICATE KEY builder.

use crate::dialect::UpsertStyle;
use crate::error::{SqlError, SqlResult};
use crate::stmt::{SqlStmt, write_column_list, write_returning};
use crate::value::Value;
use crate::writer::SqlWriter;
use std::collections::BTreeMap;

/// Single-row upsert.
///
/// Without an explicit [`UpsertStmt::update_columns`] list the conflict
/// action updates every assigned column except the conflict target,
/// in sorted order.
#[derive(Clone, Debug)]
pub struct UpsertStmt {
    table: String,
    values: BTreeMap<String, Value>,
    conflict: Vec<String>,
    update_columns: Option<Vec<String>>,
    do_nothing: bool,
    returning: Vec<String>,
}

impl UpsertStmt {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            values: BTreeMap::new(),
            conflict: Vec::new(),
            update_columns: None,
            do_nothing: false,
            returning: Vec::new(),
        }
    }

    /// Set a column value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.insert(column.to_string(), value.into());
        self
    }

    /// Conflict target columns.
    pub fn on_conflict(mut self, columns: &[&str]) -> Self {
        self.conflict = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Columns to overwrite on conflict.
    pub fn update_columns(mut self, columns: &[&str]) -> Self {
        self.update_columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Leave the existing row untouched on conflict.
    pub fn do_nothing(mut self) -> Self {
        self.do_nothing = true;
        self
    }

    pub fn returning(mut self, cols: &[&str]) -> Self {
        self.returning = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    fn update_set(&self) -> Vec<String> {
        if self.do_nothing {
            return Vec::new();
        }
        match &self.update_columns {
            Some(cols) => cols.clone(),
            // BTreeMap keys are already sorted.
            None => self
                .values
                .keys()
                .filter(|k| !self.conflict.contains(*k))
                .cloned()
                .collect(),
        }
    }
}

impl SqlStmt for UpsertStmt {
    fn kind(&self) -> &'static str {
        "upsert"
    }

    fn write_sql(&self, w: &mut SqlWriter<'_>) -> SqlResult<()> {
        if self.values.is_empty() {
            return Err(SqlError::NoAssignments(self.table.clone()));
        }
        let style = w.dialect().upsert_style();
        let update_set = self.update_set();

        if style == UpsertStyle::OnDuplicateKey && update_set.is_empty() {
            w.push("INSERT IGNORE INTO ");
        } else {
            w.push("INSERT INTO ");
        }
        w.push_column(&self.table).push(" (");
        let columns: Vec<String> = self.values.keys().cloned().collect();
        write_column_list(w, &columns);
        w.push(") VALUES (")
            .push_bind_list(self.values.values().cloned())
            .push(")");

        match style {
            UpsertStyle::OnConflict => {
                w.push(" ON CONFLICT");
                if !self.conflict.is_empty() {
                    w.push(" (");
                    write_column_list(w, &self.conflict);
                    w.push(")");
                }
                if update_set.is_empty() {
                    w.push(" DO NOTHING");
                } else {
                    if self.conflict.is_empty() {
                        return Err(SqlError::MissingConflictTarget(self.table.clone()));
                    }
                    w.push(" DO UPDATE SET ");
                    write_assignments_from_excluded(w, &update_set);
                }
            }
            UpsertStyle::OnDuplicateKey => {
                if !update_set.is_empty() {
                    w.push(" ON DUPLICATE KEY UPDATE ");
                    write_assignments_from_excluded(w, &update_set);
                }
            }
        }

        write_returning(w, &self.returning)
    }
}

fn write_assignments_from_excluded(w: &mut SqlWriter<'_>, columns: &[String]) {
    let dialect = w.dialect();
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        let quoted = dialect.quote_identifier(col);
        w.push(&quoted).push(" = ").push(&dialect.excluded_column(&quoted));
    }
}
