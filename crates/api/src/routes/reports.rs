//! Sales and delivery reports.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use domain::{ProductSales, RequesterOrders};
use serde::Deserialize;

use super::orders::OrderResponse;
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_TOP_SELLING_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct TopSellingQuery {
    pub limit: Option<usize>,
}

/// GET /reports/top-selling: products ranked by units ordered.
#[tracing::instrument(skip(state))]
pub async fn top_selling(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopSellingQuery>,
) -> Result<Json<Vec<ProductSales>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_SELLING_LIMIT);
    Ok(Json(state.reports.top_selling(limit).await?))
}

/// GET /reports/by-requester: order volume per shop.
#[tracing::instrument(skip(state))]
pub async fn by_requester(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RequesterOrders>>, ApiError> {
    Ok(Json(state.reports.orders_by_requester().await?))
}

/// GET /reports/delivery-log: delivered orders, most recent first.
#[tracing::instrument(skip(state))]
pub async fn delivery_log(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.reports.delivery_log().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
