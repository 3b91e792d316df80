//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_reimbursement::ClaimError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body failed field-level validation
    #[error("Invalid request fields")]
    InvalidFields(Vec<String>),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
                None,
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg, None)
            }
            ApiError::InvalidFields(details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Invalid request fields".to_string(),
                Some(details),
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Workflow refusals keep their meaning; store faults stay opaque
impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Validation(msg) => ApiError::Validation(msg),
            ClaimError::Forbidden(msg) => ApiError::Forbidden(msg),
            ClaimError::InvalidState(msg) => ApiError::Conflict(msg),
            ClaimError::NotFound(id) => ApiError::NotFound(format!("Claim {} not found", id)),
            other @ (ClaimError::InconsistentRecord(_) | ClaimError::Store(_)) => {
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        details.sort();
        ApiError::InvalidFields(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{ClaimId, PortError};

    fn status_of(error: ClaimError) -> StatusCode {
        ApiError::from(error).into_response().status()
    }

    #[test]
    fn test_claim_errors_map_to_statuses() {
        assert_eq!(status_of(ClaimError::validation("amount")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of(ClaimError::forbidden("owner")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(ClaimError::invalid_state("decided")), StatusCode::CONFLICT);
        assert_eq!(status_of(ClaimError::not_found(ClaimId::new(1))), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ClaimError::Store(PortError::connection("down"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message_names_the_claim() {
        match ApiError::from(ClaimError::not_found(ClaimId::new(12))) {
            ApiError::NotFound(msg) => assert_eq!(msg, "Claim CLM-12 not found"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
