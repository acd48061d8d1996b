//! Stock ledger endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{ProductId, Variant};
use serde::{Deserialize, Serialize};
use storage::StockEntry;

use super::{parse_product_id, parse_variant};
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct AddStockRequest {
    pub amount: u32,
}

#[derive(Deserialize)]
pub struct UpdateStockRequest {
    pub quantity: Option<u32>,
    pub min_quantity: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct StockResponse {
    pub product_id: ProductId,
    pub variant: Variant,
    pub quantity: u32,
    pub min_quantity: u32,
    pub low_stock: bool,
}

impl From<StockEntry> for StockResponse {
    fn from(entry: StockEntry) -> Self {
        let low_stock = entry.is_low();
        Self {
            product_id: entry.product_id,
            variant: entry.variant,
            quantity: entry.quantity,
            min_quantity: entry.min_quantity,
            low_stock,
        }
    }
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub product_id: ProductId,
    pub variant: Variant,
    pub available: u32,
}

// -- Handlers --

/// GET /stock: every entry ordered by product and variant.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StockResponse>>, ApiError> {
    let entries = state.ledger().list_all().await?;
    Ok(Json(entries.into_iter().map(StockResponse::from).collect()))
}

/// GET /stock/low: entries at or below their reorder threshold.
#[tracing::instrument(skip(state))]
pub async fn low(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StockResponse>>, ApiError> {
    let entries = state.ledger().list_low_stock().await?;
    Ok(Json(entries.into_iter().map(StockResponse::from).collect()))
}

/// GET /stock/:product_id/:variant: available quantity, 0 when unknown.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path((product_id, variant)): Path<(String, String)>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let variant = parse_variant(&variant)?;

    let available = state.ledger().get_available(&product_id, variant).await?;

    Ok(Json(AvailabilityResponse {
        product_id,
        variant,
        available,
    }))
}

/// POST /stock/:product_id/:variant/add: restock.
#[tracing::instrument(skip(state, req))]
pub async fn add(
    State(state): State<Arc<AppState>>,
    Path((product_id, variant)): Path<(String, String)>,
    Json(req): Json<AddStockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let variant = parse_variant(&variant)?;

    let entry = state.ledger().add(&product_id, variant, req.amount).await?;
    tracing::info!(%product_id, %variant, amount = req.amount, quantity = entry.quantity, "stock added");

    Ok(Json(entry.into()))
}

/// PUT /stock/:product_id/:variant: overwrite quantity and/or threshold in
/// one write.
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path((product_id, variant)): Path<(String, String)>,
    Json(req): Json<UpdateStockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let variant = parse_variant(&variant)?;

    if req.quantity.is_none() && req.min_quantity.is_none() {
        return Err(ApiError::BadRequest(
            "Either quantity or min_quantity is required".to_string(),
        ));
    }

    let entry = state
        .ledger()
        .update_levels(&product_id, variant, req.quantity, req.min_quantity)
        .await?;

    Ok(Json(entry.into()))
}
