//! Order placement workflow.

use common::{OrderId, RequesterId};
use domain::{Catalog, InventoryError, InventoryLedger, OrderStore};
use storage::{Order, OrderLineItem, OrderRepository, PerfumeRepository, StockRepository};

use crate::cart::CartLine;
use crate::error::{PlacementError, Result, Shortage};
use crate::reservation::ReservationLog;

/// Places and cancels orders across the inventory ledger and the order store.
///
/// Neither store knows about the other, so the workflow keeps them consistent
/// itself: every deduction it applies is recorded and undone in reverse if a
/// later step fails.
#[derive(Debug, Clone)]
pub struct OrderPlacementWorkflow<S, O, P>
where
    S: StockRepository,
    O: OrderRepository,
    P: PerfumeRepository,
{
    ledger: InventoryLedger<S>,
    store: OrderStore<O>,
    catalog: Catalog<P>,
}

impl<S, O, P> OrderPlacementWorkflow<S, O, P>
where
    S: StockRepository,
    O: OrderRepository,
    P: PerfumeRepository,
{
    /// Creates a new workflow over the given services.
    pub fn new(ledger: InventoryLedger<S>, store: OrderStore<O>, catalog: Catalog<P>) -> Self {
        Self {
            ledger,
            store,
            catalog,
        }
    }

    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }

    pub fn store(&self) -> &OrderStore<O> {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog<P> {
        &self.catalog
    }

    /// Validates the cart, reserves stock for every line and stores the order.
    ///
    /// On any error no stock stays deducted and no order exists.
    #[tracing::instrument(skip(self, requester_name, cart), fields(lines = cart.len()))]
    pub async fn place_order(
        &self,
        requester_id: RequesterId,
        requester_name: &str,
        cart: Vec<CartLine>,
    ) -> Result<Order> {
        let start = std::time::Instant::now();

        let result = self.try_place(requester_id, requester_name, cart).await;

        metrics::histogram!("order_placement_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(order_id = %order.id, units = order.total_units(), "order placed");
            }
            Err(e) => {
                metrics::counter!("order_placement_failures_total", "reason" => e.reason())
                    .increment(1);
            }
        }

        result
    }

    async fn try_place(
        &self,
        requester_id: RequesterId,
        requester_name: &str,
        cart: Vec<CartLine>,
    ) -> Result<Order> {
        if cart.is_empty() {
            return Err(PlacementError::EmptyOrder);
        }
        if let Some(line) = cart.iter().find(|line| line.quantity == 0) {
            return Err(PlacementError::InvalidQuantity {
                product_id: line.product_id.clone(),
                variant: line.variant,
            });
        }

        let mut items = Vec::with_capacity(cart.len());
        for line in &cart {
            let name = self
                .catalog
                .display_name(&line.product_id, line.product_name.as_deref())
                .await?;
            items.push(OrderLineItem::new(
                line.product_id.clone(),
                line.variant,
                line.quantity,
                name,
            ));
        }

        // Validation pass: report every short line, not just the first.
        let mut shortages = Vec::new();
        for item in &items {
            let available = self
                .ledger
                .get_available(&item.product_id, item.variant)
                .await?;
            if available < item.quantity {
                shortages.push(Shortage {
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    variant: item.variant,
                    available,
                    requested: item.quantity,
                });
            }
        }
        if !shortages.is_empty() {
            tracing::warn!(shortages = shortages.len(), "order rejected for insufficient stock");
            return Err(PlacementError::InsufficientStock(shortages));
        }

        // Reservation pass, in cart order.
        let mut log = ReservationLog::new();
        for item in &items {
            match self
                .ledger
                .deduct(&item.product_id, item.variant, item.quantity)
                .await
            {
                Ok(deduction) => log.record(deduction),
                Err(e) => {
                    log.compensate(&self.ledger).await;
                    return Err(match e {
                        InventoryError::InsufficientStock {
                            key,
                            available,
                            requested,
                        } => {
                            tracing::warn!(%key, available, requested, "stock changed during reservation");
                            PlacementError::ReservationConflict {
                                product_id: key.product_id,
                                variant: key.variant,
                                available,
                                requested,
                            }
                        }
                        other => other.into(),
                    });
                }
            }
        }

        match self
            .store
            .create(requester_id, requester_name, items)
            .await
        {
            Ok(order) => Ok(order),
            Err(e) => {
                tracing::error!(error = %e, "failed to persist order, releasing reserved stock");
                log.compensate(&self.ledger).await;
                Err(PlacementError::PersistenceFailure(e.to_string()))
            }
        }
    }

    /// Cancels a pending order and puts its stock back.
    ///
    /// The conditional status change is the gate: of several concurrent
    /// cancellations of one order only the first restores stock. If the
    /// stock cannot be restored, the order is put back to pending and the
    /// failure is returned.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order> {
        let cancelled = self.store.cancel(id).await?;

        if let Err(e) = self.ledger.restore(&cancelled.items).await {
            tracing::error!(order_id = %id, error = %e, "failed to restore stock, reopening order");
            if let Err(reopen) = self.store.reopen(id).await {
                tracing::error!(order_id = %id, error = %reopen, "failed to reopen order, stock not restored");
            }
            return Err(e.into());
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %id, "order cancelled, stock restored");
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use common::{OrderStatus, ProductId, Variant};
    use storage::{
        InMemoryOrderRepository, InMemoryPerfumeRepository, InMemoryStockRepository, StockEntry,
        StockKey,
    };

    use super::*;

    type TestWorkflow =
        OrderPlacementWorkflow<InMemoryStockRepository, InMemoryOrderRepository, InMemoryPerfumeRepository>;

    fn workflow(stock: Vec<StockEntry>) -> TestWorkflow {
        OrderPlacementWorkflow::new(
            InventoryLedger::new(InMemoryStockRepository::with_entries(stock)),
            OrderStore::new(InMemoryOrderRepository::new()),
            Catalog::new(InMemoryPerfumeRepository::new()),
        )
    }

    #[tokio::test]
    async fn test_place_order_uses_caller_name_then_product_id() {
        let wf = workflow(vec![
            StockEntry::new(StockKey::new("P1", Variant::Ml30), 10, 1),
            StockEntry::new(StockKey::new("P2", Variant::Ml30), 10, 1),
        ]);

        let order = wf
            .place_order(
                RequesterId::new("shop-1"),
                "Rose Shop",
                vec![
                    CartLine::new("P1", Variant::Ml30, 1).with_name("Royal Oud"),
                    CartLine::new("P2", Variant::Ml30, 1),
                ],
            )
            .await
            .unwrap();

        assert_eq!(order.items[0].product_name, "Royal Oud");
        assert_eq!(order.items[1].product_name, "P2");
        assert_eq!(order.requester_name, "Rose Shop");
    }

    #[tokio::test]
    async fn test_zero_quantity_line_has_no_side_effects() {
        let wf = workflow(vec![StockEntry::new(StockKey::new("P1", Variant::Ml30), 10, 1)]);

        let result = wf
            .place_order(
                RequesterId::new("shop-1"),
                "Rose Shop",
                vec![
                    CartLine::new("P1", Variant::Ml30, 2),
                    CartLine::new("P1", Variant::Ml30, 0),
                ],
            )
            .await;

        assert!(matches!(result, Err(PlacementError::InvalidQuantity { .. })));
        assert_eq!(
            wf.ledger()
                .get_available(&ProductId::new("P1"), Variant::Ml30)
                .await
                .unwrap(),
            10
        );
        assert!(wf.store().list_all().await.unwrap().is_empty());
    }

    struct Fixture {
        wf: TestWorkflow,
        stock: InMemoryStockRepository,
        orders: InMemoryOrderRepository,
    }

    async fn fixture_with_order() -> (Fixture, Order) {
        let stock = InMemoryStockRepository::with_entries([
            StockEntry::new(StockKey::new("P1", Variant::Ml30), 10, 1),
            StockEntry::new(StockKey::new("P2", Variant::Ml50), 10, 1),
        ]);
        let orders = InMemoryOrderRepository::new();
        let wf = OrderPlacementWorkflow::new(
            InventoryLedger::new(stock.clone()),
            OrderStore::new(orders.clone()),
            Catalog::new(InMemoryPerfumeRepository::new()),
        );
        let order = wf
            .place_order(
                RequesterId::new("shop-1"),
                "Rose Shop",
                vec![
                    CartLine::new("P1", Variant::Ml30, 4),
                    CartLine::new("P2", Variant::Ml50, 3),
                ],
            )
            .await
            .unwrap();
        (Fixture { wf, stock, orders }, order)
    }

    async fn available(wf: &TestWorkflow, product: &str, variant: Variant) -> u32 {
        wf.ledger()
            .get_available(&ProductId::new(product), variant)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_once() {
        let (fx, order) = fixture_with_order().await;

        let cancelled = fx.wf.cancel_order(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(available(&fx.wf, "P1", Variant::Ml30).await, 10);

        let again = fx.wf.cancel_order(order.id).await;
        assert!(matches!(again, Err(PlacementError::NotCancellable { .. })));
        assert_eq!(available(&fx.wf, "P1", Variant::Ml30).await, 10);
        assert_eq!(available(&fx.wf, "P2", Variant::Ml50).await, 10);
    }

    #[tokio::test]
    async fn test_cancel_with_failed_status_update_restores_nothing() {
        let (fx, order) = fixture_with_order().await;
        fx.orders.set_fail_on_update(true).await;

        let result = fx.wf.cancel_order(order.id).await;
        assert!(matches!(result, Err(PlacementError::Order(_))));

        fx.orders.set_fail_on_update(false).await;
        let stored = fx.wf.store().find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert_eq!(available(&fx.wf, "P1", Variant::Ml30).await, 6);
        assert_eq!(available(&fx.wf, "P2", Variant::Ml50).await, 7);
    }

    #[tokio::test]
    async fn test_cancel_with_failed_restore_reopens_order() {
        let (fx, order) = fixture_with_order().await;
        fx.stock
            .set_fail_on_add(StockKey::new("P2", Variant::Ml50), true)
            .await;

        let result = fx.wf.cancel_order(order.id).await;
        assert!(matches!(result, Err(PlacementError::Inventory(_))));

        let stored = fx.wf.store().find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert_eq!(available(&fx.wf, "P1", Variant::Ml30).await, 6);
        assert_eq!(available(&fx.wf, "P2", Variant::Ml50).await, 7);

        fx.stock
            .set_fail_on_add(StockKey::new("P2", Variant::Ml50), false)
            .await;
        fx.wf.cancel_order(order.id).await.unwrap();
        assert_eq!(available(&fx.wf, "P2", Variant::Ml50).await, 10);
    }

    #[tokio::test]
    async fn test_cancel_missing_order() {
        let wf = workflow(vec![]);
        let result = wf.cancel_order(OrderId::new()).await;
        assert!(matches!(result, Err(PlacementError::NotFound(_))));
    }
}
