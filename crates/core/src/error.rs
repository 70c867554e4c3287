//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is recoverable: the operation that produced it left the
/// draft unchanged (or fell back to a documented default), and the caller is
/// expected to surface the message to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bad input to a mutating operation (quantity, item, percentage, date).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Malformed persisted state (e.g. an unparsable order number).
    #[error("format error: {0}")]
    Format(String),

    /// Customer/distributor state missing or not recognised.
    #[error("unknown state: {0}")]
    StateUnknown(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn state_unknown(msg: impl Into<String>) -> Self {
        Self::StateUnknown(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
