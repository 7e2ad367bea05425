use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// AppError
///
/// The outcome taxonomy every service and handler reports through. Each variant maps to
/// exactly one HTTP status in `IntoResponse`, so handlers simply return `Result<_, AppError>`
/// and never build error responses by hand.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Bad credentials, or a missing / invalid / expired bearer token.
    #[error("invalid credentials or token")]
    Unauthorized,

    /// Valid identity, insufficient scope for the requested record.
    #[error("access to this resource is forbidden")]
    Forbidden,

    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller input breaks a business rule (bad credits, unknown reference, duplicate key).
    #[error("{0}")]
    Validation(String),

    /// The write collides with an existing row (duplicate enrollment).
    #[error("{0}")]
    Conflict(String),

    /// Store failure or a post-write reload that came back empty.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code placed in the `error` field of the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Internal details go to the log only.
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed with an internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}

/// StoreError
///
/// Failures raised by the persistence layer. Constraint violations are kept apart from
/// generic backend failures so the services can translate them into validation or
/// conflict outcomes instead of a blanket 500.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    #[error("store failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    /// Classifies a driver error by its Postgres SQLSTATE.
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => Self::UniqueViolation(message),
                    Some("23503") => Self::ForeignKeyViolation(message),
                    Some("23514") => Self::CheckViolation(message),
                    _ => Self::Backend(message),
                }
            }
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    /// Fallback translation. Services that know which constraint a write can trip map
    /// the violation themselves to give the caller a precise message.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(msg) => Self::Conflict(msg),
            StoreError::ForeignKeyViolation(msg) | StoreError::CheckViolation(msg) => {
                Self::Validation(msg)
            }
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}
