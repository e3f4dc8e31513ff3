//! Domain error types for the hiring warehouse server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Uploaded filename does not match a known table schema
    #[error("No table schema matches file '{0}'")]
    SchemaMismatch(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upload exceeds the configured size limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Warehouse could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement or commit failed
    #[error("Database error: {0}")]
    Database(String),

    /// Server is busy (load permits exhausted)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status, error_code, response_message) = match self {
            AppError::SchemaMismatch(_) => (
                StatusCode::BAD_REQUEST,
                "SCHEMA_MISMATCH",
                self.to_string(),
            ),
            AppError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", self.to_string())
            }
            AppError::PayloadTooLarge(_) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                self.to_string(),
            ),
            AppError::Connection(err_str) => {
                tracing::error!("Warehouse connection error: {}", err_str);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CONNECTION_ERROR",
                    "The warehouse could not be reached".to_string(),
                )
            }
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "The warehouse rejected the operation; nothing was committed".to_string(),
                )
            }
            AppError::ServiceUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                self.to_string(),
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_) => {
                AppError::Connection(err.to_string())
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        match err.position() {
            Some(pos) => AppError::InvalidInput(format!(
                "Malformed CSV at line {}: {}",
                pos.line(),
                err
            )),
            None => AppError::InvalidInput(format!("Malformed CSV: {}", err)),
        }
    }
}
