//! HTTP error types for the `Kayda` server.
//!
//! Maps domain errors from `kayda-core` into HTTP responses. Every error
//! variant produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`. Internal failures are logged and masked.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use kayda_core::error::{AccountError, CatalogError};

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client sent invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource already exists (duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A conditional update lost to a newer write.
    #[error("version conflict: {0}")]
    VersionConflict(String),

    /// Unknown email or wrong password at login.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account already holds a live session.
    #[error("already logged in: {0}")]
    AlreadyLoggedIn(String),

    /// Missing, unknown or expired session token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to do this.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Storage or hashing failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg),
            Self::VersionConflict(msg) => (StatusCode::CONFLICT, "version_conflict", msg),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid credentials".to_owned(),
            ),
            Self::AlreadyLoggedIn(msg) => (StatusCode::BAD_REQUEST, "already_logged_in", msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { .. } | CatalogError::ParentNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            CatalogError::InvalidRequest { reason } => Self::BadRequest(reason),
            CatalogError::VersionConflict { .. } => Self::VersionConflict(err.to_string()),
            CatalogError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Conflict { .. } => Self::Conflict(err.to_string()),
            AccountError::NotFound { .. } | AccountError::NotLoggedIn { .. } => {
                Self::NotFound(err.to_string())
            }
            AccountError::InvalidCredentials => Self::InvalidCredentials,
            AccountError::AlreadyLoggedIn { .. } => Self::AlreadyLoggedIn(err.to_string()),
            AccountError::InvalidSession => Self::Unauthorized(err.to_string()),
            AccountError::InvalidRequest { reason } => Self::BadRequest(reason),
            AccountError::Hash { .. } | AccountError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}
