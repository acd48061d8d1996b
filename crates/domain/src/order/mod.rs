//! Orders and their status lifecycle.

mod policy;
mod store;

pub use policy::{ParsePolicyError, TransitionPolicy};
pub use store::OrderStore;

use common::{OrderId, OrderStatus, ProductId, Variant};
use storage::StorageError;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    EmptyOrder,

    /// A line item asked for zero units.
    #[error("Invalid quantity for {product_id} ({variant}): must be greater than 0")]
    InvalidQuantity {
        product_id: ProductId,
        variant: Variant,
    },

    /// No order exists with this ID.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Only pending orders can be cancelled.
    #[error("Order {order_id} cannot be cancelled in {status} status")]
    NotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The status change is not allowed.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order changed status between read and write.
    #[error("Order {order_id} changed status: expected {expected}, found {actual}")]
    StatusChanged {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The repository failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
