//! Error types for crm-enrich HTTP handlers

use crate::services::CommissionError;
use crate::workflow::EnrichError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Stored data cannot be used (422), e.g. a malformed commission plan
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// crm-common error
    #[error("Common error: {0}")]
    Common(#[from] crm_common::Error),
}

impl From<EnrichError> for ApiError {
    fn from(e: EnrichError) -> Self {
        match e {
            EnrichError::ContactNotFound(id) => ApiError::NotFound(format!("Contact {}", id)),
            EnrichError::Database(e) => ApiError::Common(e),
        }
    }
}

impl From<CommissionError> for ApiError {
    fn from(e: CommissionError) -> Self {
        match e {
            CommissionError::NoPlan(agent_id) => {
                ApiError::NotFound(format!("Commission plan for agent {}", agent_id))
            }
            e @ CommissionError::InvalidPlan { .. } => ApiError::Unprocessable(e.to_string()),
            CommissionError::Database(e) => ApiError::Common(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR", err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
