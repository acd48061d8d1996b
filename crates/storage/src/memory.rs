use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId, RequesterId};
use tokio::sync::RwLock;

use crate::{
    Order, Perfume, Result, StockEntry, StockKey, StorageError,
    repository::{
        DeductOutcome, OrderRepository, PerfumeRepository, StatusUpdate, StatusUpdateOutcome,
        StockRepository,
    },
};

#[derive(Debug, Default)]
struct StockState {
    entries: BTreeMap<StockKey, StockEntry>,
    /// Keys whose next deductions report insufficient stock regardless of
    /// the stored quantity, simulating a concurrent reservation.
    contended: HashSet<StockKey>,
    /// Keys whose additions fail with `Unavailable`.
    failing_adds: HashSet<StockKey>,
}

/// In-memory stock repository.
///
/// Every operation runs under a single write lock, which makes
/// `try_deduct` an atomic compare-and-decrement.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockRepository {
    state: Arc<RwLock<StockState>>,
}

impl InMemoryStockRepository {
    /// Creates a new empty stock repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with the given entries.
    pub fn with_entries(entries: impl IntoIterator<Item = StockEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect();
        Self {
            state: Arc::new(RwLock::new(StockState {
                entries,
                ..StockState::default()
            })),
        }
    }

    /// Makes deductions for `key` fail as if another order had just taken
    /// the stock. Passing `false` clears the condition.
    pub async fn set_contended(&self, key: StockKey, contended: bool) {
        let mut state = self.state.write().await;
        if contended {
            state.contended.insert(key);
        } else {
            state.contended.remove(&key);
        }
    }

    /// Makes additions to `key` fail as if the store were unreachable.
    pub async fn set_fail_on_add(&self, key: StockKey, fail: bool) {
        let mut state = self.state.write().await;
        if fail {
            state.failing_adds.insert(key);
        } else {
            state.failing_adds.remove(&key);
        }
    }

    /// Returns the number of stored entries.
    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[async_trait]
impl StockRepository for InMemoryStockRepository {
    async fn get(&self, key: &StockKey) -> Result<Option<StockEntry>> {
        Ok(self.state.read().await.entries.get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<StockEntry>> {
        Ok(self.state.read().await.entries.values().cloned().collect())
    }

    async fn list_low_stock(&self) -> Result<Vec<StockEntry>> {
        Ok(self
            .state
            .read()
            .await
            .entries
            .values()
            .filter(|entry| entry.is_low())
            .cloned()
            .collect())
    }

    async fn try_deduct(&self, key: &StockKey, amount: u32) -> Result<DeductOutcome> {
        let mut state = self.state.write().await;
        let contended = state.contended.contains(key);

        let Some(entry) = state.entries.get_mut(key) else {
            return Ok(DeductOutcome::Insufficient { available: 0 });
        };

        if contended || entry.quantity < amount {
            return Ok(DeductOutcome::Insufficient {
                available: entry.quantity,
            });
        }

        let previous = entry.quantity;
        entry.quantity -= amount;
        Ok(DeductOutcome::Deducted {
            previous,
            remaining: entry.quantity,
        })
    }

    async fn add(
        &self,
        key: &StockKey,
        amount: u32,
        default_min_quantity: u32,
    ) -> Result<StockEntry> {
        let mut state = self.state.write().await;
        if state.failing_adds.contains(key) {
            return Err(StorageError::Unavailable(format!(
                "stock store rejected the addition to {key}"
            )));
        }
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| StockEntry::new(key.clone(), 0, default_min_quantity));
        entry.quantity = entry.quantity.saturating_add(amount);
        Ok(entry.clone())
    }

    async fn update_levels(
        &self,
        key: &StockKey,
        quantity: Option<u32>,
        min_quantity: Option<u32>,
    ) -> Result<Option<StockEntry>> {
        let mut state = self.state.write().await;
        Ok(state.entries.get_mut(key).map(|entry| {
            if let Some(quantity) = quantity {
                entry.quantity = quantity;
            }
            if let Some(min_quantity) = min_quantity {
                entry.min_quantity = min_quantity;
            }
            entry.clone()
        }))
    }
}

#[derive(Debug, Default)]
struct OrderState {
    orders: Vec<Order>,
    fail_on_insert: bool,
    fail_on_update: bool,
}

/// In-memory order repository keeping orders in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<OrderState>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty order repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the repository to reject inserts.
    pub async fn set_fail_on_insert(&self, fail: bool) {
        self.state.write().await.fail_on_insert = fail;
    }

    /// Configures the repository to reject status updates.
    pub async fn set_fail_on_update(&self, fail: bool) {
        self.state.write().await.fail_on_update = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;

        if state.fail_on_insert {
            return Err(StorageError::Unavailable(
                "order store rejected the insert".to_string(),
            ));
        }
        if state.orders.iter().any(|o| o.id == order.id) {
            return Err(StorageError::Duplicate(format!("order {}", order.id)));
        }

        state.orders.push(order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        Ok(self.state.read().await.orders.clone())
    }

    async fn list_by_requester(&self, requester_id: &RequesterId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| &o.requester_id == requester_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: OrderId,
        update: StatusUpdate,
    ) -> Result<StatusUpdateOutcome> {
        let mut state = self.state.write().await;

        if state.fail_on_update {
            return Err(StorageError::Unavailable(
                "order store rejected the status update".to_string(),
            ));
        }

        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(StatusUpdateOutcome::NotFound);
        };

        if let Some(expected) = update.expected_status
            && order.status != expected
        {
            return Ok(StatusUpdateOutcome::Conflict {
                actual: order.status,
            });
        }

        order.status = update.status;
        order.updated_at = update.updated_at;
        if let Some(note) = update.delivery_note {
            order.delivery_note = Some(note);
        }

        Ok(StatusUpdateOutcome::Updated(order.clone()))
    }
}

/// In-memory perfume catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPerfumeRepository {
    perfumes: Arc<RwLock<BTreeMap<ProductId, Perfume>>>,
}

impl InMemoryPerfumeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PerfumeRepository for InMemoryPerfumeRepository {
    async fn insert(&self, perfume: &Perfume) -> Result<()> {
        let mut perfumes = self.perfumes.write().await;
        if perfumes.contains_key(&perfume.id) {
            return Err(StorageError::Duplicate(format!("perfume {}", perfume.id)));
        }
        perfumes.insert(perfume.id.clone(), perfume.clone());
        Ok(())
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Perfume>> {
        Ok(self.perfumes.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Perfume>> {
        Ok(self.perfumes.read().await.values().cloned().collect())
    }

    async fn set_active(&self, id: &ProductId, active: bool) -> Result<bool> {
        let mut perfumes = self.perfumes.write().await;
        match perfumes.get_mut(id) {
            Some(perfume) => {
                perfume.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{OrderStatus, Variant};

    use super::*;
    use crate::OrderLineItem;

    fn key(product: &str, variant: Variant) -> StockKey {
        StockKey::new(product, variant)
    }

    fn sample_order(requester: &str) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(),
            requester_id: RequesterId::new(requester),
            requester_name: format!("Shop {requester}"),
            items: vec![OrderLineItem::new("P1", Variant::Ml30, 2, "Royal Oud")],
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            delivery_note: None,
        }
    }

    #[tokio::test]
    async fn test_add_creates_entry_with_default_min() {
        let repo = InMemoryStockRepository::new();
        let entry = repo.add(&key("P1", Variant::Ml30), 10, 5).await.unwrap();
        assert_eq!(entry.quantity, 10);
        assert_eq!(entry.min_quantity, 5);

        let entry = repo.add(&key("P1", Variant::Ml30), 3, 99).await.unwrap();
        assert_eq!(entry.quantity, 13);
        assert_eq!(entry.min_quantity, 5);
        assert_eq!(repo.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_try_deduct_is_conditional() {
        let repo = InMemoryStockRepository::with_entries([StockEntry::new(
            key("P1", Variant::Ml30),
            5,
            1,
        )]);

        let outcome = repo.try_deduct(&key("P1", Variant::Ml30), 6).await.unwrap();
        assert_eq!(outcome, DeductOutcome::Insufficient { available: 5 });

        let outcome = repo.try_deduct(&key("P1", Variant::Ml30), 5).await.unwrap();
        assert_eq!(
            outcome,
            DeductOutcome::Deducted {
                previous: 5,
                remaining: 0
            }
        );

        let missing = repo.try_deduct(&key("P9", Variant::Ml30), 1).await.unwrap();
        assert_eq!(missing, DeductOutcome::Insufficient { available: 0 });
    }

    #[tokio::test]
    async fn test_contended_key_rejects_deduction_without_mutation() {
        let repo = InMemoryStockRepository::with_entries([StockEntry::new(
            key("P1", Variant::Ml30),
            5,
            1,
        )]);
        repo.set_contended(key("P1", Variant::Ml30), true).await;

        let outcome = repo.try_deduct(&key("P1", Variant::Ml30), 1).await.unwrap();
        assert_eq!(outcome, DeductOutcome::Insufficient { available: 5 });
        let entry = repo.get(&key("P1", Variant::Ml30)).await.unwrap().unwrap();
        assert_eq!(entry.quantity, 5);

        repo.set_contended(key("P1", Variant::Ml30), false).await;
        let outcome = repo.try_deduct(&key("P1", Variant::Ml30), 1).await.unwrap();
        assert!(matches!(outcome, DeductOutcome::Deducted { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_deductions_never_oversell() {
        let repo = InMemoryStockRepository::with_entries([StockEntry::new(
            key("P1", Variant::Ml30),
            10,
            1,
        )]);

        let mut handles = Vec::new();
        for _ in 0..25 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.try_deduct(&key("P1", Variant::Ml30), 1).await.unwrap()
            }));
        }

        let mut deducted = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), DeductOutcome::Deducted { .. }) {
                deducted += 1;
            }
        }

        assert_eq!(deducted, 10);
        let entry = repo.get(&key("P1", Variant::Ml30)).await.unwrap().unwrap();
        assert_eq!(entry.quantity, 0);
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let repo = InMemoryStockRepository::with_entries([
            StockEntry::new(key("P1", Variant::Ml30), 50, 10),
            StockEntry::new(key("P3", Variant::Ml30), 8, 10),
            StockEntry::new(key("P4", Variant::Ml50), 8, 8),
        ]);

        let low = repo.list_low_stock().await.unwrap();
        let keys: Vec<_> = low.iter().map(StockEntry::key).collect();
        assert_eq!(
            keys,
            vec![key("P3", Variant::Ml30), key("P4", Variant::Ml50)]
        );
    }

    #[tokio::test]
    async fn test_update_levels_requires_existing_entry() {
        let repo = InMemoryStockRepository::new();
        assert!(
            repo.update_levels(&key("P1", Variant::Ml30), Some(3), None)
                .await
                .unwrap()
                .is_none()
        );
        repo.add(&key("P1", Variant::Ml30), 1, 5).await.unwrap();

        let entry = repo
            .update_levels(&key("P1", Variant::Ml30), Some(3), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((entry.quantity, entry.min_quantity), (3, 5));

        let entry = repo
            .update_levels(&key("P1", Variant::Ml30), Some(7), Some(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!((entry.quantity, entry.min_quantity), (7, 2));
    }

    #[tokio::test]
    async fn test_fail_on_add_leaves_entry_untouched() {
        let repo = InMemoryStockRepository::with_entries([StockEntry::new(
            key("P1", Variant::Ml30),
            5,
            1,
        )]);
        repo.set_fail_on_add(key("P1", Variant::Ml30), true).await;

        let result = repo.add(&key("P1", Variant::Ml30), 3, 5).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        let entry = repo.get(&key("P1", Variant::Ml30)).await.unwrap().unwrap();
        assert_eq!(entry.quantity, 5);

        repo.set_fail_on_add(key("P1", Variant::Ml30), false).await;
        let entry = repo.add(&key("P1", Variant::Ml30), 3, 5).await.unwrap();
        assert_eq!(entry.quantity, 8);
    }

    #[tokio::test]
    async fn test_orders_listed_in_insertion_order() {
        let repo = InMemoryOrderRepository::new();
        let first = sample_order("shop-1");
        let second = sample_order("shop-2");
        let third = sample_order("shop-1");
        for order in [&first, &second, &third] {
            repo.insert(order).await.unwrap();
        }

        let all: Vec<_> = repo.list().await.unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(all, vec![first.id, second.id, third.id]);

        let mine: Vec<_> = repo
            .list_by_requester(&RequesterId::new("shop-1"))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(mine, vec![first.id, third.id]);
    }

    #[tokio::test]
    async fn test_fail_on_insert() {
        let repo = InMemoryOrderRepository::new();
        repo.set_fail_on_insert(true).await;

        let result = repo.insert(&sample_order("shop-1")).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        assert_eq!(repo.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_fail_on_update_keeps_status() {
        let repo = InMemoryOrderRepository::new();
        let order = sample_order("shop-1");
        repo.insert(&order).await.unwrap();
        repo.set_fail_on_update(true).await;

        let result = repo
            .update_status(order.id, StatusUpdate::new(OrderStatus::Cancelled))
            .await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        let stored = repo.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_conditional_status_update() {
        let repo = InMemoryOrderRepository::new();
        let order = sample_order("shop-1");
        repo.insert(&order).await.unwrap();

        let outcome = repo
            .update_status(
                order.id,
                StatusUpdate::new(OrderStatus::Preparing).with_note(Some("packed".to_string())),
            )
            .await
            .unwrap();
        let StatusUpdateOutcome::Updated(updated) = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(updated.status, OrderStatus::Preparing);
        assert_eq!(updated.delivery_note.as_deref(), Some("packed"));

        let outcome = repo
            .update_status(
                order.id,
                StatusUpdate::new(OrderStatus::Cancelled).expect_status(OrderStatus::Pending),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            StatusUpdateOutcome::Conflict {
                actual: OrderStatus::Preparing
            }
        );

        let missing = repo
            .update_status(OrderId::new(), StatusUpdate::new(OrderStatus::Delivered))
            .await
            .unwrap();
        assert_eq!(missing, StatusUpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_perfume_insert_rejects_duplicates() {
        let repo = InMemoryPerfumeRepository::new();
        let perfume = Perfume {
            id: ProductId::new("P1"),
            name: "Royal Oud".to_string(),
            brand: Some("Antaali".to_string()),
            description: None,
            is_active: true,
        };
        repo.insert(&perfume).await.unwrap();
        assert!(matches!(
            repo.insert(&perfume).await,
            Err(StorageError::Duplicate(_))
        ));

        assert!(repo.set_active(&perfume.id, false).await.unwrap());
        assert!(!repo.get(&perfume.id).await.unwrap().unwrap().is_active);
        assert!(!repo.set_active(&ProductId::new("P9"), false).await.unwrap());
    }
}
