//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
///
/// Retry semantics: only `Conflict` is transient (optimistic concurrency);
/// everything else is deterministic and must not be retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty reason, zero quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An outward operation requested more stock than is on hand.
    ///
    /// Carries the exact available quantity so the caller can render an
    /// actionable message ("only N available").
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { available: u32, requested: u32 },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested component was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A concurrent modification was detected (stale version).
    ///
    /// Safe to retry with a bounded attempt count at the caller boundary.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The actor's role does not grant the attempted operation.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(available: u32, requested: u32) -> Self {
        Self::InsufficientStock {
            available,
            requested,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Whether a caller may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
