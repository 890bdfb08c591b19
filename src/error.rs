//! Error types for the Elidune record engine

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes returned in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    BadValue = 18,
    NoSuchData = 20,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// A record-level operation aborted; its transaction was rolled back.
    /// `record_id` is `None` for a record that was being created.
    #[error("Failed to {action} {}: {source}", record_label(.record_id))]
    Record {
        record_id: Option<i32>,
        action: &'static str,
        source: Box<AppError>,
    },
}

fn record_label(record_id: &Option<i32>) -> String {
    match record_id {
        Some(id) => format!("record {}", id),
        None => "record".to_string(),
    }
}

impl AppError {
    /// Wrap an error raised while operating on a record
    pub fn record(action: &'static str, record_id: i32, source: AppError) -> Self {
        AppError::Record {
            record_id: Some(record_id),
            action,
            source: Box::new(source),
        }
    }

    /// Wrap an error raised while creating a record
    pub fn record_creation(source: AppError) -> Self {
        AppError::Record {
            record_id: None,
            action: "create",
            source: Box::new(source),
        }
    }

    /// Innermost error, unwrapping record-level context
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Record { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), AppError::NotFound(_))
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self.root() {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Record { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::Failure,
                "Internal server error".to_string(),
            ),
        };

        let message = match &self {
            AppError::Record {
                record_id, action, ..
            } => format!("Failed to {} {}: {}", action, record_label(record_id), detail),
            _ => detail,
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
