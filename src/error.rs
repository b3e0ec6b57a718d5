use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// ErrorBody
///
/// The `{ "error": "..." }` envelope returned by every failing endpoint.
#[derive(Debug, Serialize, Clone, utoipa::ToSchema)]
pub struct ErrorBody {
    #[schema(example = "title, url missing")]
    pub error: String,
}

/// ServiceError
///
/// The closed error taxonomy produced by the service layer and the identity
/// resolver. Each variant maps 1:1 onto a status code and a client-visible
/// message; `Unhandled` carries internal detail that is logged, never sent.
#[derive(Debug, Error, PartialEq)]
pub enum ServiceError {
    /// Missing or malformed input fields.
    #[error("{0}")]
    Validation(String),
    /// A unique key (the username) already exists.
    #[error("{0}")]
    UniquenessViolation(String),
    /// No acting identity where one is required, or bad login credentials.
    #[error("{0}")]
    Unauthenticated(&'static str),
    /// Authenticated, but not allowed to touch this resource.
    #[error("only the creator can delete a blog")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A bearer token was presented but failed signature/structure checks.
    #[error("token invalid")]
    InvalidToken,
    #[error("internal server error")]
    Unhandled(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::UniquenessViolation(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Unauthenticated(_) | ServiceError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ServiceError::Unhandled(detail) => tracing::error!("unhandled error: {}", detail),
            other => tracing::debug!(status = status.as_u16(), "request rejected: {}", other),
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// RepositoryError
///
/// Storage-level failures. Constraint violations are classified here so the
/// service layer never has to look at engine-specific error codes.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("{0}")]
    CheckViolation(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            if db.is_unique_violation() {
                return RepositoryError::UniqueViolation(constraint);
            }
            if db.is_check_violation() {
                return RepositoryError::CheckViolation(check_message(&constraint));
            }
        }
        RepositoryError::Database(err.to_string())
    }
}

/// Turns a Postgres CHECK constraint name into the message a client sees.
fn check_message(constraint: &str) -> String {
    match constraint {
        "users_username_length" => USERNAME_TOO_SHORT.to_string(),
        "blogs_likes_check" => "likes must not be negative".to_string(),
        other => format!("constraint {} violated", other),
    }
}

pub(crate) const USERNAME_TOO_SHORT: &str =
    "username is shorter than the minimum allowed length (3)";

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueViolation(_) => {
                ServiceError::UniquenessViolation("Username must be unique".to_string())
            }
            RepositoryError::CheckViolation(msg) => ServiceError::Validation(msg),
            RepositoryError::Database(detail) => ServiceError::Unhandled(detail),
        }
    }
}
