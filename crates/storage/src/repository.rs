use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus, ProductId, RequesterId};

use crate::{Order, Perfume, Result, StockEntry, StockKey};

/// Result of a conditional stock deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductOutcome {
    /// The quantity was decremented.
    Deducted { previous: u32, remaining: u32 },

    /// Not enough stock; nothing changed. A missing entry reports 0.
    Insufficient { available: u32 },
}

/// Persistence for stock entries.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Retrieves the entry for a key.
    async fn get(&self, key: &StockKey) -> Result<Option<StockEntry>>;

    /// Retrieves all entries ordered by (product, variant).
    async fn list(&self) -> Result<Vec<StockEntry>>;

    /// Retrieves entries whose quantity is at or below their minimum,
    /// ordered by (product, variant).
    async fn list_low_stock(&self) -> Result<Vec<StockEntry>>;

    /// Decrements the quantity by `amount` if and only if at least `amount`
    /// is available.
    ///
    /// The check and the decrement happen as one atomic step, so two callers
    /// can never reserve the same units.
    async fn try_deduct(&self, key: &StockKey, amount: u32) -> Result<DeductOutcome>;

    /// Increments the quantity, creating the entry with `default_min_quantity`
    /// when it does not exist yet.
    async fn add(&self, key: &StockKey, amount: u32, default_min_quantity: u32)
    -> Result<StockEntry>;

    /// Overwrites the quantity and/or the reorder threshold of an existing
    /// entry in a single write. `None` keeps the stored value.
    ///
    /// Returns None if the entry doesn't exist.
    async fn update_levels(
        &self,
        key: &StockKey,
        quantity: Option<u32>,
        min_quantity: Option<u32>,
    ) -> Result<Option<StockEntry>>;
}

/// A status change to apply to a stored order.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub delivery_note: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// If set, the update only applies while the order is in this status.
    pub expected_status: Option<OrderStatus>,
}

impl StatusUpdate {
    /// Creates an unconditional update stamped with the current time.
    pub fn new(status: OrderStatus) -> Self {
        Self {
            status,
            delivery_note: None,
            updated_at: Utc::now(),
            expected_status: None,
        }
    }

    /// Attaches a delivery note.
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.delivery_note = note;
        self
    }

    /// Makes the update conditional on the current status.
    pub fn expect_status(mut self, status: OrderStatus) -> Self {
        self.expected_status = Some(status);
        self
    }
}

/// Result of applying a [`StatusUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdateOutcome {
    Updated(Order),
    NotFound,
    /// The order was not in the expected status; nothing changed.
    Conflict { actual: OrderStatus },
}

/// Persistence for orders and their line items.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order with its line items atomically.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Retrieves an order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Retrieves all orders in insertion order.
    async fn list(&self) -> Result<Vec<Order>>;

    /// Retrieves orders placed by one requester, in insertion order.
    async fn list_by_requester(&self, requester_id: &RequesterId) -> Result<Vec<Order>>;

    /// Applies a status change, keeping an existing delivery note when the
    /// update carries none.
    async fn update_status(&self, id: OrderId, update: StatusUpdate)
    -> Result<StatusUpdateOutcome>;
}

/// Persistence for the perfume catalog.
#[async_trait]
pub trait PerfumeRepository: Send + Sync {
    /// Stores a new perfume; fails with `Duplicate` if the ID is taken.
    async fn insert(&self, perfume: &Perfume) -> Result<()>;

    async fn get(&self, id: &ProductId) -> Result<Option<Perfume>>;

    /// Retrieves all perfumes ordered by ID.
    async fn list(&self) -> Result<Vec<Perfume>>;

    /// Sets the active flag. Returns false if the perfume doesn't exist.
    async fn set_active(&self, id: &ProductId, active: bool) -> Result<bool>;
}

// Shared handles delegate to the wrapped repository, so services can be built
// over `Arc<dyn StockRepository>` when the backend is chosen at runtime.

#[async_trait]
impl<T: StockRepository + ?Sized> StockRepository for std::sync::Arc<T> {
    async fn get(&self, key: &StockKey) -> Result<Option<StockEntry>> {
        (**self).get(key).await
    }

    async fn list(&self) -> Result<Vec<StockEntry>> {
        (**self).list().await
    }

    async fn list_low_stock(&self) -> Result<Vec<StockEntry>> {
        (**self).list_low_stock().await
    }

    async fn try_deduct(&self, key: &StockKey, amount: u32) -> Result<DeductOutcome> {
        (**self).try_deduct(key, amount).await
    }

    async fn add(
        &self,
        key: &StockKey,
        amount: u32,
        default_min_quantity: u32,
    ) -> Result<StockEntry> {
        (**self).add(key, amount, default_min_quantity).await
    }

    async fn update_levels(
        &self,
        key: &StockKey,
        quantity: Option<u32>,
        min_quantity: Option<u32>,
    ) -> Result<Option<StockEntry>> {
        (**self).update_levels(key, quantity, min_quantity).await
    }
}

#[async_trait]
impl<T: OrderRepository + ?Sized> OrderRepository for std::sync::Arc<T> {
    async fn insert(&self, order: &Order) -> Result<()> {
        (**self).insert(order).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Order>> {
        (**self).list().await
    }

    async fn list_by_requester(&self, requester_id: &RequesterId) -> Result<Vec<Order>> {
        (**self).list_by_requester(requester_id).await
    }

    async fn update_status(
        &self,
        id: OrderId,
        update: StatusUpdate,
    ) -> Result<StatusUpdateOutcome> {
        (**self).update_status(id, update).await
    }
}

#[async_trait]
impl<T: PerfumeRepository + ?Sized> PerfumeRepository for std::sync::Arc<T> {
    async fn insert(&self, perfume: &Perfume) -> Result<()> {
        (**self).insert(perfume).await
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Perfume>> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Perfume>> {
        (**self).list().await
    }

    async fn set_active(&self, id: &ProductId, active: bool) -> Result<bool> {
        (**self).set_active(id, active).await
    }
}
