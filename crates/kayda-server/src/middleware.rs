//! Authentication middleware for the `Kayda` server.
//!
//! [`session_auth`] reads `Authorization: Bearer <token>`, resolves it to a
//! [`Principal`] through the account repository and injects it into the
//! request extensions. [`require_admin`] runs after it on admin routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use kayda_core::models::Principal;

use crate::error::AppError;
use crate::state::AppState;

/// Middleware that requires a live session.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] if the header is missing, is not a
/// bearer token, or names an unknown or expired session.
pub async fn session_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(header) = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Err(AppError::Unauthorized(
            "missing Authorization header".to_owned(),
        ));
    };

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Authorization header must use Bearer scheme".to_owned())
        })?
        .to_owned();

    let principal = state.accounts.resolve_session(&token).await?;
    debug!(email = %principal.email, is_admin = principal.is_admin, "session resolved");
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Middleware that rejects callers without the admin flag.
///
/// Must be layered inside [`session_auth`].
///
/// # Errors
///
/// - [`AppError::Unauthorized`] if no principal was resolved.
/// - [`AppError::Forbidden`] if the principal is not an admin.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<Principal>() {
        Some(p) if p.is_admin => Ok(next.run(req).await),
        Some(p) => Err(AppError::Forbidden(format!(
            "account '{}' is not an admin",
            p.email
        ))),
        None => Err(AppError::Unauthorized("authentication required".to_owned())),
    }
}
