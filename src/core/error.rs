use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A create/update pointed at a related row that does not exist.
    /// Carries the offending field name (`providerId`, `categoryId`, ...).
    #[error("Reference error: {0} does not reference an existing record")]
    Reference(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::Reference(ref field) => (
                StatusCode::BAD_REQUEST,
                self.to_string(),
                Some(vec![field.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
        };

        let body = Json(ErrorResponse::new(message, errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures reported by store implementations.
///
/// Stores classify backend errors into the cases services need to
/// translate; everything else stays wrapped in `Backend`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist (update/delete of a missing id).
    #[error("row not found")]
    RowNotFound,

    /// A foreign key pointed at a missing row. Holds the API field name.
    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Delete refused because other rows still point at this one.
    #[error("row is still referenced: {0}")]
    StillReferenced(String),

    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RowNotFound => AppError::NotFound("Record not found".to_string()),
            StoreError::MissingReference(field) => AppError::Reference(field),
            StoreError::UniqueViolation(what) => {
                AppError::Conflict(format!("Duplicate value for {}", what))
            }
            StoreError::StillReferenced(what) => {
                AppError::Conflict(format!("Record is still referenced by {}", what))
            }
            StoreError::Backend(e) => AppError::Database(e),
        }
    }
}
