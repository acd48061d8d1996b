//! Placement error types.

use common::{OrderId, OrderStatus, ProductId, Variant};
use domain::{CatalogError, InventoryError, OrderError};
use serde::Serialize;
use thiserror::Error;

/// One cart line that cannot be served from current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortage {
    pub product_id: ProductId,
    pub product_name: String,
    pub variant: Variant,
    pub available: u32,
    pub requested: u32,
}

impl std::fmt::Display for Shortage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): available {}, requested {}",
            self.product_name, self.variant, self.available, self.requested
        )
    }
}

fn describe(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while placing or cancelling an order.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The cart has no lines.
    #[error("Order has no items")]
    EmptyOrder,

    /// A cart line asked for zero units.
    #[error("Invalid quantity for {product_id} ({variant}): must be greater than 0")]
    InvalidQuantity {
        product_id: ProductId,
        variant: Variant,
    },

    /// Validation found lines that cannot be served. Lists all of them.
    #[error("Insufficient stock: {}", describe(.0))]
    InsufficientStock(Vec<Shortage>),

    /// Stock changed between validation and deduction.
    #[error(
        "Stock for {product_id} ({variant}) changed during reservation: available {available}, requested {requested}"
    )]
    ReservationConflict {
        product_id: ProductId,
        variant: Variant,
        available: u32,
        requested: u32,
    },

    /// Stock was reserved but the order could not be stored.
    #[error("Failed to persist order: {0}")]
    PersistenceFailure(String),

    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Order {order_id} cannot be cancelled in {status} status")]
    NotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Order error: {0}")]
    Order(OrderError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl PlacementError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyOrder => "empty_order",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::ReservationConflict { .. } => "reservation_conflict",
            Self::PersistenceFailure(_) => "persistence_failure",
            Self::NotFound(_) => "not_found",
            Self::NotCancellable { .. } => "not_cancellable",
            Self::Inventory(_) => "inventory",
            Self::Order(_) => "order",
            Self::Catalog(_) => "catalog",
        }
    }
}

impl From<OrderError> for PlacementError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => Self::NotFound(id),
            OrderError::NotCancellable { order_id, status } => {
                Self::NotCancellable { order_id, status }
            }
            other => Self::Order(other),
        }
    }
}

/// Convenience type alias for placement results.
pub type Result<T> = std::result::Result<T, PlacementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_lists_every_shortage() {
        let err = PlacementError::InsufficientStock(vec![
            Shortage {
                product_id: ProductId::new("P1"),
                product_name: "Royal Oud".to_string(),
                variant: Variant::Ml30,
                available: 3,
                requested: 5,
            },
            Shortage {
                product_id: ProductId::new("P3"),
                product_name: "Amber Musk".to_string(),
                variant: Variant::Ml100,
                available: 0,
                requested: 1,
            },
        ]);

        assert_eq!(
            err.to_string(),
            "Insufficient stock: Royal Oud (30ml): available 3, requested 5; \
             Amber Musk (100ml): available 0, requested 1"
        );
        assert_eq!(err.reason(), "insufficient_stock");
    }

    #[test]
    fn test_order_errors_map_to_placement_variants() {
        let id = OrderId::new();
        assert!(matches!(
            PlacementError::from(OrderError::NotFound(id)),
            PlacementError::NotFound(found) if found == id
        ));
        assert!(matches!(
            PlacementError::from(OrderError::EmptyOrder),
            PlacementError::Order(OrderError::EmptyOrder)
        ));
    }
}
