//! Error taxonomy shared by every workflow operation.

use thiserror::Error;

/// Classified failure of a workflow operation.
///
/// Validation failures are raised before any write. `ExternalService` wraps
/// datastore, blob-storage and auth-provider failures so callers can treat
/// them uniformly.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing or malformed required field, caught before any I/O.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced entity absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Actor lacks the role or ownership required for the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness or state invariant violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Datastore, blob storage or auth provider failed or timed out.
    #[error("External service error: {0}")]
    ExternalService(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        DomainError::ExternalService(msg.into())
    }
}
