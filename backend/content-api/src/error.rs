use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use async_graphql::ErrorExtensions;
use serde::Serialize;
use thiserror::Error;

/// Result type for content-api operations
pub type Result<T> = std::result::Result<T, AppError>;

/// A single field-level validation failure, surfaced in the error envelope.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Application error types
///
/// Every error reaching a client carries a message and a numeric status
/// classifier; validation errors additionally carry field-level detail.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input, with per-field messages
    #[error("Invalid input.")]
    Validation(Vec<FieldError>),

    /// Missing or invalid credentials or token
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not the resource owner
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource (e.g. registration with a taken email)
    #[error("{0}")]
    Conflict(String),

    /// Object storage upload/delete failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Field-level detail for validation errors, absent otherwise.
    pub fn detail(&self) -> Option<&[FieldError]> {
        match self {
            AppError::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = AppError::status_code(self);
        let mut body = serde_json::json!({
            "message": self.to_string(),
            "status": status.as_u16(),
        });
        if let Some(fields) = self.detail() {
            body["data"] = serde_json::json!(fields);
        }

        HttpResponse::build(status).json(body)
    }
}

/// GraphQL surface: same envelope, carried in error extensions.
impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| {
            ext.set("status", AppError::status_code(self).as_u16());
            if let Some(fields) = self.detail() {
                if let Ok(data) = async_graphql::Value::from_json(serde_json::json!(fields)) {
                    ext.set("data", data);
                }
            }
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classifiers() {
        let validation = AppError::Validation(vec![FieldError::new("title", "Title is invalid.")]);
        assert_eq!(validation.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            AppError::Unauthorized("Not authenticated!".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("Not authorized!".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("No post found!".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("User exists already!".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Storage("upload failed".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_detail_present() {
        let err = AppError::Validation(vec![
            FieldError::new("title", "Title is invalid."),
            FieldError::new("content", "Content is invalid."),
        ]);
        let detail = err.detail().expect("validation errors carry detail");
        assert_eq!(detail.len(), 2);
        assert_eq!(detail[0].field, "title");
        assert!(AppError::NotFound("gone".into()).detail().is_none());
    }

    #[test]
    fn test_graphql_extension_status() {
        let err = AppError::Unauthorized("Not authenticated!".into());
        let gql = err.extend();
        assert_eq!(gql.message, "Not authenticated!");
        assert!(gql.extensions.is_some());
    }
}
