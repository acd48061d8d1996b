//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod perfumes;
pub mod reports;
pub mod stock;

use common::{OrderId, ProductId, Variant};

use crate::error::ApiError;

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    OrderId::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}

pub(crate) fn parse_variant(variant: &str) -> Result<Variant, ApiError> {
    variant
        .parse()
        .map_err(|e: common::ParseVariantError| ApiError::BadRequest(e.to_string()))
}

pub(crate) fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("Product ID is required".to_string()));
    }
    Ok(ProductId::new(id))
}
