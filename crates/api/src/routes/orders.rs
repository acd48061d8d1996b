//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderStatus, RequesterId};
use domain::OrderStats;
use placement::CartLine;
use serde::{Deserialize, Serialize};
use storage::Order;

use super::{parse_order_id, parse_product_id, parse_variant};
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub requester_id: String,
    pub requester_name: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub variant: String,
    pub quantity: u32,
    pub product_name: Option<String>,
}

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    pub requester_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub delivery_note: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub requester_id: String,
    pub requester_name: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_units: u64,
    pub delivery_note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub variant: String,
    pub quantity: u32,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total_units = order.total_units();
        Self {
            id: order.id.to_string(),
            requester_id: order.requester_id.to_string(),
            requester_name: order.requester_name,
            status: order.status.to_string(),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name,
                    variant: item.variant.to_string(),
                    quantity: item.quantity,
                })
                .collect(),
            total_units,
            delivery_note: order.delivery_note,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    status
        .parse()
        .map_err(|e: common::ParseStatusError| ApiError::BadRequest(e.to_string()))
}

// -- Handlers --

/// POST /orders: validate the cart, reserve stock and create the order.
#[tracing::instrument(skip(state, req))]
pub async fn place(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    if req.requester_id.trim().is_empty() {
        return Err(ApiError::BadRequest("requester_id is required".to_string()));
    }

    let cart = req
        .items
        .iter()
        .map(|item| {
            Ok(CartLine {
                product_id: parse_product_id(&item.product_id)?,
                variant: parse_variant(&item.variant)?,
                quantity: item.quantity,
                product_name: item.product_name.clone(),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let order = state
        .workflow
        .place_order(
            RequesterId::new(req.requester_id.trim()),
            &req.requester_name,
            cart,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders: all orders oldest first, optionally filtered by requester
/// and status.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let mut orders = match query.requester_id.as_deref() {
        Some(requester) => {
            state
                .orders()
                .list_by_requester(&RequesterId::new(requester))
                .await?
        }
        None => state.orders().list_all().await?,
    };
    if let Some(status) = status {
        orders.retain(|order| order.status == status);
    }

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/stats: order counts per status.
#[tracing::instrument(skip(state))]
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<OrderStats>, ApiError> {
    Ok(Json(state.orders().stats().await?))
}

#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders()
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(order.into()))
}

/// PATCH /orders/:id/status: move an order through preparation and delivery.
#[tracing::instrument(skip(state, req))]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status = parse_status(&req.status)?;

    let order = state
        .orders()
        .update_status(order_id, status, req.delivery_note)
        .await?;
    tracing::info!(%order_id, %status, "order status updated");

    Ok(Json(order.into()))
}

/// POST /orders/:id/cancel: cancel a pending order and restore its stock.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.workflow.cancel_order(order_id).await?;
    Ok(Json(order.into()))
}
