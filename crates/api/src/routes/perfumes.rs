//! Perfume catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::NewPerfume;
use serde::Deserialize;
use storage::Perfume;

use super::parse_product_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListPerfumesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// GET /perfumes: active perfumes, or all with `?include_inactive=true`.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPerfumesQuery>,
) -> Result<Json<Vec<Perfume>>, ApiError> {
    Ok(Json(state.catalog().list(query.include_inactive).await?))
}

/// POST /perfumes: add a catalog entry.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewPerfume>,
) -> Result<(StatusCode, Json<Perfume>), ApiError> {
    let perfume = state.catalog().create(req).await?;
    tracing::info!(perfume_id = %perfume.id, "perfume created");
    Ok((StatusCode::CREATED, Json(perfume)))
}

/// DELETE /perfumes/:id: hide a perfume from the default listing.
#[tracing::instrument(skip(state))]
pub async fn deactivate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_product_id(&id)?;
    state.catalog().deactivate(&id).await?;
    tracing::info!(perfume_id = %id, "perfume deactivated");
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Perfume>, ApiError> {
    let id = parse_product_id(&id)?;
    state
        .catalog()
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Perfume {id} not found")))
}
