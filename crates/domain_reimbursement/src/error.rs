//! Reimbursement domain errors
//!
//! Every variant except `Store` is a decision outcome of the workflow, not an
//! infrastructure fault, so none of them is worth retrying unchanged.

use thiserror::Error;

use core_kernel::{ClaimId, CoreError, PortError};

/// Errors that can occur in the reimbursement domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Malformed input; the caller can correct it and resubmit
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authenticated but not entitled to the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Operation not legal for the claim's current status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Claim not found: {0}")]
    NotFound(String),

    /// A persisted record violates the claim invariants
    #[error("Inconsistent claim record: {0}")]
    InconsistentRecord(String),

    #[error("Store error: {0}")]
    Store(PortError),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ClaimError::Forbidden(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ClaimError::InvalidState(message.into())
    }

    pub fn not_found(id: ClaimId) -> Self {
        ClaimError::NotFound(id.to_string())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClaimError::Validation(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ClaimError::Forbidden(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, ClaimError::InvalidState(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClaimError::NotFound(_))
    }
}

impl From<CoreError> for ClaimError {
    fn from(error: CoreError) -> Self {
        ClaimError::Validation(error.to_string())
    }
}

/// Store failures keep their meaning where the workflow has one: a missing
/// row is `NotFound`, a lost compare-and-set is `InvalidState`.
impl From<PortError> for ClaimError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { id, .. } => ClaimError::NotFound(id),
            PortError::Conflict { message } => ClaimError::InvalidState(message),
            PortError::Validation { message, .. } => ClaimError::Validation(message),
            other => ClaimError::Store(other),
        }
    }
}
