//! Statement composers.
//!
//! Each builder owns its clause lists and follows the consuming
//! `mut self -> Self` style. Calls that can reject caller input return
//! `SqlResult<Self>` instead, so the error surfaces where it was introduced.
//!
//! # Usage
//!
//! ```ignore
//! use sqlweave::{stmt, Postgres, SqlStmt};
//!
//! let built = stmt::select("users")
//!     .select_cols(&["id", "name"])
//!     .eq("status", "active")
//!     .order_by_desc("created_at")
//!     .limit(20)
//!     .build(&Postgres)?;
//! // built.sql  == r#"SELECT "id", "name" FROM "users" WHERE "status" = $1 ORDER BY "created_at" DESC LIMIT 20"#
//! // built.args == [Value::Text("active")]
//! ```

mod batch;
mod cte;
mod delete;
mod filter;
mod select;
mod update;
mod upsert;


pub use batch::{BatchInsertStmt, BatchUpdateStmt};
pub use cte::{Cte, CteList};
pub use delete::DeleteStmt;
pub use filter::Filters;
pub use select::{JoinKind, SelectItem, SelectStmt, SetOp, Source};
pub use update::UpdateStmt;
pub use upsert::UpsertStmt;

use crate::config::BuildConfig;
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use crate::writer::{Built, SqlWriter};

/// Default byte limit for SQL text in `sqlweave.build` events.
const DEFAULT_LOGGED_SQL_LEN: usize = 200;

/// Common interface of every statement builder.
pub trait SqlStmt {
    /// Statement kind used in logs (`select`, `update`, ...).
    fn kind(&self) -> &'static str;

    /// Write the statement's neutral SQL and values.
    fn write_sql(&self, w: &mut SqlWriter<'_>) -> SqlResult<()>;

    /// Render to neutral SQL (`?` markers) and the ordered values.
    fn render(&self, dialect: &dyn Dialect) -> SqlResult<(String, Vec<Value>)> {
        let mut w = SqlWriter::new(dialect);
        self.write_sql(&mut w)?;
        Ok(w.into_parts())
    }

    /// Render and resolve placeholders for `dialect`.
    fn build(&self, dialect: &dyn Dialect) -> SqlResult<Built> {
        let mut w = SqlWriter::new(dialect);
        self.write_sql(&mut w)?;
        let built = w.finish()?;
        log_built(self.kind(), dialect, &built, Some(DEFAULT_LOGGED_SQL_LEN));
        Ok(built)
    }

    /// Build with the dialect and logging options from `config`.
    fn build_with_config(&self, config: &BuildConfig) -> SqlResult<Built> {
        let dialect = config.dialect()?;
        let mut w = SqlWriter::new(dialect);
        self.write_sql(&mut w)?;
        let built = w.finish()?;
        if config.log_sql {
            log_built(self.kind(), dialect, &built, config.max_logged_sql_len);
        }
        Ok(built)
    }

    /// Debug helper returning only the final SQL text.
    fn to_sql(&self, dialect: &dyn Dialect) -> SqlResult<String> {
        let mut w = SqlWriter::new(dialect);
        self.write_sql(&mut w)?;
        Ok(w.finish()?.sql)
    }
}

fn log_built(kind: &'static str, dialect: &dyn Dialect, built: &Built, max_len: Option<usize>) {
    tracing::debug!(
        target: "sqlweave.build",
        kind,
        dialect = dialect.name(),
        arg_count = built.args.len(),
        sql = %truncate_sql(&built.sql, max_len),
        "built statement"
    );
}

fn truncate_sql(sql: &str, max_bytes: Option<usize>) -> String {
    match max_bytes {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while end > 0 && !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end])
        }
        _ => sql.to_string(),
    }
}

/// Write ` RETURNING cols` or fail when the dialect lacks it.
pub(crate) fn write_returning(w: &mut SqlWriter<'_>, returning: &[String]) -> SqlResult<()> {
    if returning.is_empty() {
        return Ok(());
    }
    let dialect = w.dialect();
    if !dialect.supports_returning() {
        return Err(SqlError::Unsupported {
            dialect: dialect.name(),
            feature: "RETURNING",
        });
    }
    w.push(" RETURNING ");
    write_column_list(w, returning);
    Ok(())
}

/// Write `cols` comma-separated, each through column quoting.
pub(crate) fn write_column_list(w: &mut SqlWriter<'_>, cols: &[String]) {
    for (i, col) in cols.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.push_column(col);
    }
}

/// Create a SELECT builder for a table.
pub fn select(table: &str) -> SelectStmt {
    SelectStmt::new(table)
}

/// Create an UPDATE builder for a table.
pub fn update(table: &str) -> UpdateStmt {
    UpdateStmt::new(table)
}

/// Create a DELETE builder for a table.
pub fn delete(table: &str) -> DeleteStmt {
    DeleteStmt::new(table)
}

/// Create an INSERT ... ON CONFLICT builder for a table.
pub fn upsert(table: &str) -> UpsertStmt {
    UpsertStmt::new(table)
}

/// Create a multi-row INSERT builder with a fixed column list.
pub fn batch_insert(table: &str, columns: &[&str]) -> BatchInsertStmt {
    BatchInsertStmt::new(table, columns)
}

/// Create a CASE-based multi-row UPDATE keyed by `key_column`.
pub fn batch_update(table: &str, key_column: &str) -> BatchUpdateStmt {
    BatchUpdateStmt::new(table, key_column)
}
