//! Act name search: `GET /search-acts-by-name?query=&jurisdiction=`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use kayda_core::models::Act;

use super::{parse_jurisdiction, ApiQuery};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/search-acts-by-name", get(search_acts))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub jurisdiction: Option<String>,
}

/// The query is matched literally; regex syntax has no special meaning.
async fn search_acts(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Act>>, AppError> {
    let jurisdiction = parse_jurisdiction(params.jurisdiction.as_deref())?;
    Ok(Json(
        state.acts.search_by_name(jurisdiction, &params.query).await?,
    ))
}
