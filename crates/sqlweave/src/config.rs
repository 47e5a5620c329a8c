//! Configuration types.
//!
//! All config structs deserialize with `serde`, so they can be embedded in an
//! application's TOML/JSON settings.

use crate::dialect::{Dialect, dialect_by_name};
use crate::error::{SqlError, SqlResult};
use serde::Deserialize;

/// Prepared statement cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatementCacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for StatementCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 256,
        }
    }
}

impl StatementCacheConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries, pinned ones included.
    ///
    /// Pinned entries may push the size past this bound until they are
    /// unpinned. A capacity of 0 disables caching.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self.enabled = capacity > 0;
        self
    }

    /// Disable caching.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Effective capacity (0 when disabled).
    pub fn effective_capacity(&self) -> usize {
        if self.enabled { self.capacity } else { 0 }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Dialect name, resolved with [`dialect_by_name`].
    pub dialect: String,
    /// Emit a `sqlweave.build` debug event for every rendered statement.
    pub log_sql: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_logged_sql_len: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dialect: "postgres".to_string(),
            log_sql: true,
            max_logged_sql_len: Some(200),
        }
    }
}

impl BuildConfig {
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            ..Self::default()
        }
    }

    /// Disable SQL logging.
    pub fn no_logging(mut self) -> Self {
        self.log_sql = false;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_logged_sql_len(mut self, len: usize) -> Self {
        self.max_logged_sql_len = Some(len);
        self
    }

    /// Resolve the configured dialect.
    pub fn dialect(&self) -> SqlResult<&'static dyn Dialect> {
        dialect_by_name(&self.dialect)
            .ok_or_else(|| SqlError::Other(format!("unknown dialect '{}'", self.dialect)))
    }
}

/// Escape pairs applied to LIKE patterns before wildcards are added.
///
/// Pairs are applied in order, so the escape character itself must come first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LikeEscapes(pub Vec<(String, String)>);

impl Default for LikeEscapes {
    fn default() -> Self {
        Self(vec![
            ("\\".to_string(), "\\\\".to_string()),
            ("%".to_string(), "\\%".to_string()),
            ("_".to_string(), "\\_".to_string()),
        ])
    }
}

impl LikeEscapes {
    /// No escaping: patterns are bound as given.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The escape character these pairs introduce.
    ///
    /// Read from the first pair, whose replacement must be a single
    /// character followed by the original text (`%` -> `!%`). `None` when
    /// there are no pairs or the first one has another shape.
    pub fn escape_char(&self) -> Option<char> {
        let (from, to) = self.0.first()?;
        let prefix = to.strip_suffix(from.as_str())?;
        let mut chars = prefix.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    /// Apply every pair to `pattern`.
    pub fn apply(&self, pattern: &str) -> String {
        self.0
            .iter()
            .fold(pattern.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}
