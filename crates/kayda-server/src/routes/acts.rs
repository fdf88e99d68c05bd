//! Act routes: `/acts`, `/acts/{id}`, `/acts/{id}/content`

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use kayda_core::acts::NewAct;
use kayda_core::models::{Act, ActContent};

use super::{parse_id, parse_jurisdiction, ApiJson, ApiQuery, JurisdictionQuery};
use crate::error::AppError;
use crate::state::AppState;

/// Public read routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/acts", get(list_acts))
        .route("/acts/{id}", get(get_act))
        .route("/acts/{id}/content", get(get_content))
}

/// Admin write routes.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/acts", post(create_act))
        .route("/acts/{id}", put(update_act).delete(delete_act))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateActRequest {
    #[serde(default)]
    pub name: String,
    pub content: Option<String>,
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActDeleteResponse {
    pub message: String,
    pub groups_removed: usize,
    pub sections_removed: usize,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn list_acts(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<JurisdictionQuery>,
) -> Result<Json<Vec<Act>>, AppError> {
    let jurisdiction = parse_jurisdiction(query.jurisdiction.as_deref())?;
    Ok(Json(state.acts.list(jurisdiction).await?))
}

async fn get_act(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Act>, AppError> {
    let id = parse_id("act", &id)?;
    Ok(Json(state.acts.get(id).await?))
}

async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActContent>, AppError> {
    let id = parse_id("act", &id)?;
    Ok(Json(state.acts.content(id).await?))
}

async fn create_act(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CreateActRequest>,
) -> Result<(StatusCode, Json<Act>), AppError> {
    let jurisdiction = parse_jurisdiction(body.jurisdiction.as_deref())?;
    let act = state
        .acts
        .create(NewAct {
            jurisdiction,
            name: body.name,
            content: body.content,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(act)))
}

async fn update_act(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateActRequest>,
) -> Result<Json<Act>, AppError> {
    let id = parse_id("act", &id)?;
    Ok(Json(state.acts.update(id, body.name, body.content).await?))
}

async fn delete_act(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ActDeleteResponse>, AppError> {
    let id = parse_id("act", &id)?;
    let removal = state.acts.delete(id).await?;
    Ok(Json(ActDeleteResponse {
        message: "act deleted".to_owned(),
        groups_removed: removal.groups,
        sections_removed: removal.sections,
    }))
}
