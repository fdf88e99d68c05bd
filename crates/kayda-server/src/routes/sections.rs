//! Section routes: `/acts/{id}/sections`, `/groups/{id}/sections`, `/sections/{id}`
//!
//! A Section id is globally unique, so `/sections/{id}` never needs the
//! caller to say which Act, Group or jurisdiction it belongs to.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use kayda_core::models::{Parent, Section, SectionPatch};

use super::{parse_id, ApiJson, MessageResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Public read routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/acts/{id}/sections", get(list_act_sections))
        .route("/groups/{id}/sections", get(list_group_sections))
        .route("/sections/{id}", get(get_section))
}

/// Admin write routes.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/acts/{id}/sections", post(create_act_section))
        .route("/groups/{id}/sections", post(create_group_section))
        .route("/sections/{id}", put(update_section).delete(delete_section))
}

#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
    pub description: Option<String>,
}

async fn list_act_sections(
    State(state): State<Arc<AppState>>,
    Path(act_id): Path<String>,
) -> Result<Json<Vec<Section>>, AppError> {
    let parent = Parent::Act(parse_id("act", &act_id)?);
    Ok(Json(state.sections.list_by_parent(parent).await?))
}

async fn list_group_sections(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Section>>, AppError> {
    let parent = Parent::Group(parse_id("group", &group_id)?);
    Ok(Json(state.sections.list_by_parent(parent).await?))
}

async fn get_section(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Section>, AppError> {
    let id = parse_id("section", &id)?;
    Ok(Json(state.sections.get(id).await?))
}

async fn create_act_section(
    State(state): State<Arc<AppState>>,
    Path(act_id): Path<String>,
    ApiJson(body): ApiJson<CreateSectionRequest>,
) -> Result<(StatusCode, Json<Section>), AppError> {
    let parent = Parent::Act(parse_id("act", &act_id)?);
    create_under(&state, parent, body).await
}

async fn create_group_section(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    ApiJson(body): ApiJson<CreateSectionRequest>,
) -> Result<(StatusCode, Json<Section>), AppError> {
    let parent = Parent::Group(parse_id("group", &group_id)?);
    create_under(&state, parent, body).await
}

async fn create_under(
    state: &AppState,
    parent: Parent,
    body: CreateSectionRequest,
) -> Result<(StatusCode, Json<Section>), AppError> {
    let section = state
        .sections
        .create(parent, &body.name, &body.text, body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(section)))
}

async fn update_section(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<SectionPatch>,
) -> Result<Json<Section>, AppError> {
    let id = parse_id("section", &id)?;
    Ok(Json(state.sections.update(id, patch).await?))
}

async fn delete_section(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id("section", &id)?;
    state.sections.delete(id).await?;
    Ok(Json(MessageResponse::new("section deleted")))
}
