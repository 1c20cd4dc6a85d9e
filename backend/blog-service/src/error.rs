/// Error types for blog-service
///
/// Every action fails with exactly one `AppError`. Messages are safe to show to
/// callers: storage failures are logged where they happen and surface only as
/// `FetchFailed` / `CreateFailed`.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::fmt;
use thiserror::Error;
use validator::ValidationErrors;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// The entity a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    /// A user referenced as the author of new content
    Author,
    Post,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => write!(f, "User"),
            Entity::Author => write!(f, "Author"),
            Entity::Post => write!(f, "Post"),
        }
    }
}

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    DuplicateEmail,
    OperationFailed,
}

/// Application error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    /// A required field was missing; raised before any query
    #[error("{0}")]
    Validation(String),

    /// The entity, or an entity referenced by a write, does not exist
    #[error("{0} not found")]
    NotFound(Entity),

    /// Email uniqueness violated
    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// A read failed for a reason other than absence
    #[error("Failed to fetch {0}")]
    FetchFailed(&'static str),

    /// A write failed for a reason other than the cases above
    #[error("Failed to create {0}")]
    CreateFailed(&'static str),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::DuplicateEmail => ErrorKind::DuplicateEmail,
            AppError::FetchFailed(_) | AppError::CreateFailed(_) => ErrorKind::OperationFailed,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid input".to_string());

        AppError::Validation(message)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DuplicateEmail => StatusCode::CONFLICT,
            ErrorKind::OperationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use validator::Validate;

    #[test]
    fn test_messages() {
        assert_eq!(AppError::NotFound(Entity::User).to_string(), "User not found");
        assert_eq!(
            AppError::NotFound(Entity::Author).to_string(),
            "Author not found"
        );
        assert_eq!(AppError::NotFound(Entity::Post).to_string(), "Post not found");
        assert_eq!(
            AppError::DuplicateEmail.to_string(),
            "A user with this email already exists"
        );
        assert_eq!(
            AppError::FetchFailed("users").to_string(),
            "Failed to fetch users"
        );
        assert_eq!(
            AppError::CreateFailed("user").to_string(),
            "Failed to create user"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound(Entity::Post).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::CreateFailed("post").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_errors_keep_message() {
        let errors = NewUser::new("", None).validate().unwrap_err();
        let err = AppError::from(errors);

        assert_eq!(err, AppError::Validation("Email is required".to_string()));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
