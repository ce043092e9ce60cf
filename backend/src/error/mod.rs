use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    /// The gallery ceiling would be exceeded; the gallery is left unchanged.
    #[error("{0}")]
    CapacityExceeded(String),
    /// Blob I/O failure. The cause is logged, never surfaced to end users.
    #[error("blob storage failure: {0}")]
    Storage(anyhow::Error),
    /// Record-store commit failure. The cause is logged, never surfaced.
    #[error("persistence failure: {0}")]
    Persistence(anyhow::Error),
    /// Password reset requested for an unknown or inactive account.
    /// Renders the same HTTP body as a bad token (anti-enumeration).
    #[error("reset requested for unknown or inactive account")]
    InvalidResetRequest,
    /// Reset token missing, already consumed, or past its expiry.
    #[error("reset token missing, consumed, or expired")]
    InvalidOrExpiredToken,
    #[error("internal server error: {0}")]
    InternalServerError(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND".to_string(), None),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                "UNAUTHORIZED".to_string(),
                None,
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN".to_string(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT".to_string(), None),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "BAD_REQUEST".to_string(),
                None,
            ),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            AppError::CapacityExceeded(msg) => (
                StatusCode::CONFLICT,
                msg,
                "CAPACITY_EXCEEDED".to_string(),
                None,
            ),
            AppError::Storage(err) => {
                tracing::error!("Blob storage error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not store uploaded files".to_string(),
                    "STORAGE_FAILED".to_string(),
                    None,
                )
            }
            AppError::Persistence(err) => {
                tracing::error!("Persistence error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not save changes".to_string(),
                    "PERSISTENCE_FAILED".to_string(),
                    None,
                )
            }
            // Both reset failures map to one body so a caller cannot tell
            // "no such account" apart from "bad token".
            AppError::InvalidResetRequest | AppError::InvalidOrExpiredToken => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired reset request".to_string(),
                "INVALID_RESET_REQUEST".to_string(),
                None,
            ),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::Persistence(err.into()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        AppError::Validation(messages)
    }
}
