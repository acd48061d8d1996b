//! Persisted records.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus, ProductId, RequesterId, Variant};
use serde::{Deserialize, Serialize};

/// Key of a stock entry: one product in one package size.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: ProductId,
    pub variant: Variant,
}

impl StockKey {
    pub fn new(product_id: impl Into<ProductId>, variant: Variant) -> Self {
        Self {
            product_id: product_id.into(),
            variant,
        }
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.product_id, self.variant)
    }
}

/// Available quantity of one (product, variant) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub product_id: ProductId,
    pub variant: Variant,
    pub quantity: u32,
    /// Reorder threshold: the entry counts as low stock at or below it.
    pub min_quantity: u32,
}

impl StockEntry {
    pub fn new(key: StockKey, quantity: u32, min_quantity: u32) -> Self {
        Self {
            product_id: key.product_id,
            variant: key.variant,
            quantity,
            min_quantity,
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.product_id.clone(), self.variant)
    }

    /// Returns true if the quantity is at or below the reorder threshold.
    pub fn is_low(&self) -> bool {
        self.quantity <= self.min_quantity
    }
}

/// One requested (product, variant, quantity) within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub variant: Variant,
    pub quantity: u32,
    /// Display label resolved when the order was placed.
    pub product_name: String,
}

impl OrderLineItem {
    pub fn new(
        product_id: impl Into<ProductId>,
        variant: Variant,
        quantity: u32,
        product_name: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variant,
            quantity,
            product_name: product_name.into(),
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.product_id.clone(), self.variant)
    }
}

/// A purchase request from a shop to the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub requester_id: RequesterId,
    pub requester_name: String,
    pub items: Vec<OrderLineItem>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub delivery_note: Option<String>,
}

impl Order {
    /// Total number of units across all line items.
    pub fn total_units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// A perfume in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perfume {
    pub id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}
