use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::json;
use thiserror::Error;

/// Field name to messages, serialized as `{"field": ["message", ...]}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("database error: {0}")]
    Database(#[from] DieselError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A validation error carrying a single message for `field`.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn no_data() -> Self {
        Self::field(NON_FIELD_ERRORS, "No data provided.")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) | AppError::EmptyCart => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::Database(DieselError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the error is a unique-constraint violation raised by the store.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                _
            ))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(errors) => json!(errors),
            AppError::Conflict(message) => json!({ "error": message }),
            AppError::Database(DieselError::NotFound) => json!({ "detail": "Not found." }),
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                json!({ "detail": "Internal server error." })
            }
            AppError::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                json!({ "detail": "Internal server error." })
            }
            other => json!({ "detail": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

pub fn internal_error<E>(err: E) -> AppError
where
    E: std::error::Error,
{
    AppError::Internal(err.to_string())
}

pub async fn handler_404() -> impl IntoResponse {
    AppError::NotFound("Not found.".to_owned())
}
