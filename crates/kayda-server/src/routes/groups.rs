//! Group routes: `/acts/{id}/groups`, `/groups/{id}`

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use kayda_core::models::Group;

use super::{parse_id, ApiJson};
use crate::error::AppError;
use crate::state::AppState;

/// Public read routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/acts/{id}/groups", get(list_groups))
}

/// Admin write routes.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/acts/{id}/groups", post(create_group))
        .route("/groups/{id}", put(update_group).delete(delete_group))
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupDeleteResponse {
    pub message: String,
    pub sections_removed: usize,
}

async fn list_groups(
    State(state): State<Arc<AppState>>,
    Path(act_id): Path<String>,
) -> Result<Json<Vec<Group>>, AppError> {
    let act_id = parse_id("act", &act_id)?;
    Ok(Json(state.groups.list_by_act(act_id).await?))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    Path(act_id): Path<String>,
    ApiJson(body): ApiJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    let act_id = parse_id("act", &act_id)?;
    let group = state
        .groups
        .create(act_id, &body.name, body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateGroupRequest>,
) -> Result<Json<Group>, AppError> {
    let id = parse_id("group", &id)?;
    Ok(Json(
        state.groups.update(id, body.name, body.description).await?,
    ))
}

async fn delete_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GroupDeleteResponse>, AppError> {
    let id = parse_id("group", &id)?;
    let sections_removed = state.groups.delete(id).await?;
    Ok(Json(GroupDeleteResponse {
        message: "group deleted".to_owned(),
        sections_removed,
    }))
}
