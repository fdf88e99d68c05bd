//! Account routes: registration, login/logout and admin user management.
//!
//! `/register` and `/login` are public. `/logout` ends the caller's own
//! session. Everything under [`admin_router`] requires an admin session.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use kayda_core::models::{AccountSummary, LoginGrant, Principal};

use super::{ApiJson, MessageResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Public credential routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes that need any live session.
pub fn session_router() -> Router<Arc<AppState>> {
    Router::new().route("/logout", post(logout))
}

/// Admin account management.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/add-user", post(add_user))
        .route("/make-admin", post(make_admin))
        .route("/remove-admin", post(remove_admin))
        .route("/reset-password", post(reset_password))
        .route("/delete-user", post(delete_user))
}

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "isAdmin")]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), AppError> {
    let account = state.accounts.register(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginGrant>, AppError> {
    Ok(Json(
        state
            .accounts
            .authenticate(&body.email, &body.password)
            .await?,
    ))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.logout(&principal.email).await?;
    Ok(Json(MessageResponse::new("logged out")))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AccountSummary>>, AppError> {
    Ok(Json(state.accounts.list().await?))
}

async fn add_user(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    ApiJson(body): ApiJson<AddUserRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), AppError> {
    let account = state
        .accounts
        .create(&body.email, &body.password, body.is_admin)
        .await?;
    tracing::info!(by = %principal.email, email = %account.email, "account added by admin");
    Ok((StatusCode::CREATED, Json(account)))
}

async fn make_admin(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<EmailRequest>,
) -> Result<Json<AccountSummary>, AppError> {
    Ok(Json(state.accounts.set_admin(&body.email, true).await?))
}

async fn remove_admin(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<EmailRequest>,
) -> Result<Json<AccountSummary>, AppError> {
    Ok(Json(state.accounts.set_admin(&body.email, false).await?))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .accounts
        .reset_password(&body.email, &body.new_password)
        .await?;
    Ok(Json(MessageResponse::new("password reset")))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.delete(&body.email).await?;
    Ok(Json(MessageResponse::new("account deleted")))
}
