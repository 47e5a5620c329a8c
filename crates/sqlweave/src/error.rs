//! Error types for sqlweave

use thiserror::Error;

/// Result type alias for sqlweave operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while composing or rendering statements.
///
/// Composition errors are caller programming errors: they are reported by the
/// call that introduced them and never degrade into partial SQL.
#[derive(Debug, Error)]
pub enum SqlError {
    /// A batch statement was built without any rows
    #[error("Batch statement on '{0}' has no rows")]
    EmptyBatch(String),

    /// A row's value count does not match the declared column count
    #[error("Row {row}: expected {expected} values, found {found}")]
    RowArity {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A batch-update row assigns no columns
    #[error("Row {row} assigns no columns")]
    EmptyRow { row: usize },

    /// A statement that needs assignments has none
    #[error("Statement on '{0}' assigns no columns")]
    NoAssignments(String),

    /// `DO UPDATE` without a conflict target
    #[error("Upsert on '{0}' needs a conflict target to update on conflict")]
    MissingConflictTarget(String),

    /// Invalid CTE declaration (missing name or body)
    #[error("Invalid CTE: {0}")]
    InvalidCte(String),

    /// A recursive CTE body is not an anchor UNION recursive-term
    #[error("Recursive CTE '{0}' must be a UNION of an anchor and a recursive term")]
    RecursiveCteNotUnion(String),

    /// A filter operand of an unsupported kind
    #[error("Unsupported filter operand: {0}")]
    UnsupportedOperand(String),

    /// Placeholder markers and bound values disagree
    #[error("Placeholder mismatch: {markers} markers for {args} values")]
    PlaceholderMismatch { markers: usize, args: usize },

    /// The target dialect cannot express the requested feature
    #[error("{feature} is not supported by the {dialect} dialect")]
    Unsupported {
        dialect: &'static str,
        feature: &'static str,
    },

    /// Identifier failed validation
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlError {
    /// Create an invalid CTE error
    pub fn invalid_cte(message: impl Into<String>) -> Self {
        Self::InvalidCte(message.into())
    }

    /// Create an unsupported operand error
    pub fn unsupported_operand(message: impl Into<String>) -> Self {
        Self::UnsupportedOperand(message.into())
    }

    /// Check if this error was raised while composing a statement.
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyBatch(_)
                | Self::RowArity { .. }
                | Self::EmptyRow { .. }
                | Self::NoAssignments(_)
                | Self::MissingConflictTarget(_)
                | Self::InvalidCte(_)
                | Self::RecursiveCteNotUnion(_)
                | Self::UnsupportedOperand(_)
                | Self::InvalidIdentifier(_)
        )
    }
}
