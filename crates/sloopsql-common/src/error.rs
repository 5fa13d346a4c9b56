#![coverage(off)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced at the analysis/rewrite invocation boundary.
///
/// Expression and plan nodes are immutable, so a failed analysis leaves no
/// partial mutation behind: either a whole new subtree is produced or the
/// original is retained.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Type incompatibility: {0}")]
    TypeIncompatible(String),

    #[error("Malformed subquery: {0}")]
    MalformedSubquery(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn type_incompatible(msg: impl Into<String>) -> Self {
        Error::TypeIncompatible(msg.into())
    }

    pub fn malformed_subquery(msg: impl Into<String>) -> Self {
        Error::MalformedSubquery(msg.into())
    }

    pub fn function_not_found(msg: impl Into<String>) -> Self {
        Error::FunctionNotFound(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }

    pub fn unsupported_expression(msg: impl Into<String>) -> Self {
        Error::UnsupportedExpression(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}
