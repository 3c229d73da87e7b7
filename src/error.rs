//! Error types for Bookline server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable error codes. Clients branch on these to decide
/// whether to retry, pick another slot, or pick another booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Validation,
    SlotUnavailable,
    InvalidTransition,
    IdempotencyConflict,
    IdempotencyRequestInProgress,
    DbFailure,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::SlotUnavailable => "SLOT_UNAVAILABLE",
            ErrorCode::InvalidTransition => "INVALID_TRANSITION",
            ErrorCode::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            ErrorCode::IdempotencyRequestInProgress => "IDEMPOTENCY_REQUEST_IN_PROGRESS",
            ErrorCode::DbFailure => "DB_FAILURE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Shift boundary or overlap violation, including races lost at commit
    /// time. Callers cannot distinguish the two cases.
    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    /// Illegal lifecycle edge, including any mutation of a terminal state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Idempotency key reused with a different request payload.
    #[error("Idempotency conflict: {0}")]
    IdempotencyConflict(String),

    /// A request with the same idempotency key is still in flight.
    #[error("Request already in progress for idempotency key")]
    IdempotencyInProgress,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::SlotUnavailable(_)
            | AppError::InvalidTransition(_)
            | AppError::IdempotencyConflict(_)
            | AppError::IdempotencyInProgress => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Validation(_) => ErrorCode::Validation,
            AppError::SlotUnavailable(_) => ErrorCode::SlotUnavailable,
            AppError::InvalidTransition(_) => ErrorCode::InvalidTransition,
            AppError::IdempotencyConflict(_) => ErrorCode::IdempotencyConflict,
            AppError::IdempotencyInProgress => ErrorCode::IdempotencyRequestInProgress,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// The response body this error renders to, also used verbatim as the
    /// cached response for idempotent replay.
    pub fn response_body(&self) -> serde_json::Value {
        let message = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        serde_json::json!({
            "code": self.code().as_str(),
            "message": message,
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.response_body());
        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Returns the database constraint a write was rejected by, if any.
///
/// Storage-level races (the exclusion constraint on bookings, the unique
/// insert on idempotency keys) are recognized by constraint name, never by
/// matching error message text.
pub fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) => db.constraint(),
        _ => None,
    }
}
