//! # sqlweave
//!
//! A dialect-aware SQL statement builder.
//!
//! ## Features
//!
//! - **Composable expressions**: AND/OR/NOT, IN, BETWEEN, LIKE with escaping, EXISTS, CASE and friends
//! - **Statement builders**: SELECT (joins, CTEs, set operations), UPDATE, DELETE, upsert, batch insert/update
//! - **One placeholder pass**: builders write a neutral `?` marker; a single scan turns it into `$n` or `?`
//! - **Dialects**: identifier quoting, placeholder style and function fallbacks come from a [`Dialect`]
//! - **Safe defaults**: DELETE without a filter matches nothing, UPDATE requires SET
//! - **Statement cache**: bounded LRU of prepared handles with pinning
//!
//! ## Usage
//!
//! ```ignore
//! use sqlweave::{stmt, Expr, Postgres, SqlStmt};
//!
//! let built = stmt::select("users")
//!     .eq("status", "active")
//!     .where_(Expr::in_list("role", ["admin", "owner"]))
//!     .or_where(Expr::is_null("deleted_at"))
//!     .order_by_desc("created_at")
//!     .limit(10)
//!     .build(&Postgres)?;
//!
//! // SELECT * FROM "users" WHERE ("status" = $1 AND "role" IN ($2, $3)) OR ("deleted_at" IS NULL)
//! //   ORDER BY "created_at" DESC LIMIT 10
//! let rows = client.query(&built.sql, &built.params_ref()).await?;
//! ```

pub mod cache;
pub mod config;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod ident;
pub mod placeholder;
pub mod prepared;
pub mod stmt;
pub mod value;
pub mod writer;

pub use cache::{CacheStats, StatementCache};
pub use config::{BuildConfig, LikeEscapes, StatementCacheConfig};
pub use dialect::{
    ConcatStyle, Dialect, MySql, PlaceholderStyle, Postgres, Sqlite, UpsertStyle, dialect_by_name,
};
pub use error::{SqlError, SqlResult};
pub use expr::{CaseExpr, CmpOp, ExistsOperand, Expr, LikeExpr, Term, Wildcard};
pub use ident::Ident;
pub use placeholder::resolve_placeholders;
pub use prepared::{CachedPreparer, StatementClient};
pub use stmt::{
    BatchInsertStmt, BatchUpdateStmt, Cte, DeleteStmt, SelectStmt, SqlStmt, UpdateStmt,
    UpsertStmt, batch_insert, batch_update, delete, select, update, upsert,
};
pub use value::Value;
pub use writer::{Built, SqlWriter};
