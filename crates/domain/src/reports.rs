//! Read-only summaries computed from stored orders.

use std::collections::BTreeMap;

use common::{OrderStatus, ProductId, RequesterId};
use serde::Serialize;
use storage::{Order, OrderRepository, StorageError};

/// Number of orders per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub preparing: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

impl OrderStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut stats = Self::default();
        for order in orders {
            stats.total += 1;
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Preparing => stats.preparing += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }
}

/// Units sold of one product across all its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub product_name: String,
    pub total_quantity: u64,
    pub order_count: usize,
}

/// Order volume of one requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequesterOrders {
    pub requester_id: RequesterId,
    pub requester_name: String,
    pub order_count: usize,
    pub total_units: u64,
}

/// Ranks products by units ordered, ignoring cancelled orders.
///
/// Ties are broken by product ID.
pub fn top_selling(orders: &[Order], limit: usize) -> Vec<ProductSales> {
    let mut by_product: BTreeMap<&ProductId, ProductSales> = BTreeMap::new();

    for order in orders.iter().filter(|o| o.status != OrderStatus::Cancelled) {
        let mut counted: Vec<&ProductId> = Vec::new();
        for item in &order.items {
            let sales = by_product
                .entry(&item.product_id)
                .or_insert_with(|| ProductSales {
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    total_quantity: 0,
                    order_count: 0,
                });
            sales.total_quantity += u64::from(item.quantity);
            if !counted.contains(&&item.product_id) {
                sales.order_count += 1;
                counted.push(&item.product_id);
            }
        }
    }

    let mut ranked: Vec<ProductSales> = by_product.into_values().collect();
    // Stable sort keeps the BTreeMap's product ID order among equal totals.
    ranked.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    ranked.truncate(limit);
    ranked
}

/// Counts non-cancelled orders per requester, busiest first.
pub fn orders_by_requester(orders: &[Order]) -> Vec<RequesterOrders> {
    let mut by_requester: BTreeMap<&RequesterId, RequesterOrders> = BTreeMap::new();

    for order in orders.iter().filter(|o| o.status != OrderStatus::Cancelled) {
        let entry = by_requester
            .entry(&order.requester_id)
            .or_insert_with(|| RequesterOrders {
                requester_id: order.requester_id.clone(),
                requester_name: order.requester_name.clone(),
                order_count: 0,
                total_units: 0,
            });
        entry.order_count += 1;
        entry.total_units += order.total_units();
    }

    let mut ranked: Vec<RequesterOrders> = by_requester.into_values().collect();
    ranked.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    ranked
}

/// Delivered orders, most recently updated first.
pub fn delivery_log(orders: &[Order]) -> Vec<Order> {
    let mut delivered: Vec<Order> = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .cloned()
        .collect();
    delivered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    delivered
}

/// Report service reading straight from the order repository.
#[derive(Debug, Clone)]
pub struct Reports<R: OrderRepository> {
    repo: R,
}

impl<R: OrderRepository> Reports<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn top_selling(&self, limit: usize) -> Result<Vec<ProductSales>, StorageError> {
        Ok(top_selling(&self.repo.list().await?, limit))
    }

    pub async fn orders_by_requester(&self) -> Result<Vec<RequesterOrders>, StorageError> {
        Ok(orders_by_requester(&self.repo.list().await?))
    }

    pub async fn delivery_log(&self) -> Result<Vec<Order>, StorageError> {
        Ok(delivery_log(&self.repo.list().await?))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use common::{OrderId, Variant};
    use storage::OrderLineItem;

    use super::*;

    fn order(requester: &str, status: OrderStatus, items: Vec<OrderLineItem>) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(),
            requester_id: RequesterId::new(requester),
            requester_name: format!("{requester} name"),
            items,
            status,
            created_at: now,
            updated_at: now,
            delivery_note: None,
        }
    }

    fn item(product: &str, variant: Variant, quantity: u32) -> OrderLineItem {
        OrderLineItem::new(product, variant, quantity, format!("{product} name"))
    }

    #[test]
    fn test_top_selling_sums_variants_and_skips_cancelled() {
        let orders = vec![
            order(
                "shop-1",
                OrderStatus::Pending,
                vec![item("P1", Variant::Ml30, 5), item("P1", Variant::Ml50, 3)],
            ),
            order("shop-2", OrderStatus::Delivered, vec![item("P2", Variant::Ml30, 8)]),
            order("shop-2", OrderStatus::Cancelled, vec![item("P3", Variant::Ml30, 50)]),
            order("shop-3", OrderStatus::Preparing, vec![item("P0", Variant::Ml100, 8)]),
        ];

        let ranked = top_selling(&orders, 10);
        let summary: Vec<_> = ranked
            .iter()
            .map(|s| (s.product_id.to_string(), s.total_quantity, s.order_count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("P0".to_string(), 8, 1),
                ("P1".to_string(), 8, 1),
                ("P2".to_string(), 8, 1),
            ]
        );

        assert_eq!(top_selling(&orders, 2).len(), 2);
    }

    #[test]
    fn test_orders_by_requester() {
        let orders = vec![
            order("shop-1", OrderStatus::Pending, vec![item("P1", Variant::Ml30, 5)]),
            order("shop-2", OrderStatus::Pending, vec![item("P1", Variant::Ml30, 1)]),
            order("shop-2", OrderStatus::Delivered, vec![item("P2", Variant::Ml30, 2)]),
            order("shop-1", OrderStatus::Cancelled, vec![item("P2", Variant::Ml30, 2)]),
        ];

        let ranked = orders_by_requester(&orders);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].requester_id, RequesterId::new("shop-2"));
        assert_eq!(ranked[0].order_count, 2);
        assert_eq!(ranked[0].total_units, 3);
        assert_eq!(ranked[1].order_count, 1);
    }

    #[test]
    fn test_delivery_log_newest_first() {
        let mut older = order("shop-1", OrderStatus::Delivered, vec![item("P1", Variant::Ml30, 1)]);
        older.updated_at = Utc::now() - Duration::hours(2);
        let newer = order("shop-2", OrderStatus::Delivered, vec![item("P1", Variant::Ml30, 1)]);
        let pending = order("shop-3", OrderStatus::Pending, vec![item("P1", Variant::Ml30, 1)]);

        let log = delivery_log(&[older.clone(), pending, newer.clone()]);
        let ids: Vec<_> = log.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[test]
    fn test_stats_counts_each_status() {
        let orders = vec![
            order("s", OrderStatus::Pending, vec![]),
            order("s", OrderStatus::Pending, vec![]),
            order("s", OrderStatus::Preparing, vec![]),
            order("s", OrderStatus::Cancelled, vec![]),
        ];
        assert_eq!(
            OrderStats::from_orders(&orders),
            OrderStats {
                total: 4,
                pending: 2,
                preparing: 1,
                delivered: 0,
                cancelled: 1,
            }
        );
    }
}
