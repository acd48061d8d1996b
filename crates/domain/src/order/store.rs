//! Order store providing the order lifecycle over an [`OrderRepository`].

use chrono::Utc;
use common::{OrderId, OrderStatus, RequesterId};
use storage::{Order, OrderLineItem, OrderRepository, StatusUpdate, StatusUpdateOutcome};

use super::{OrderError, TransitionPolicy};
use crate::reports::OrderStats;

/// Service for managing orders.
///
/// Creating an order never touches inventory; reserving stock is the job of
/// the placement workflow, which calls [`OrderStore::create`] last.
#[derive(Debug, Clone)]
pub struct OrderStore<R: OrderRepository> {
    repo: R,
    policy: TransitionPolicy,
}

impl<R: OrderRepository> OrderStore<R> {
    /// Creates a new order store with the default transition policy.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            policy: TransitionPolicy::default(),
        }
    }

    /// Sets the policy applied by [`OrderStore::update_status`].
    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Persists a new pending order.
    #[tracing::instrument(skip(self, requester_name, items), fields(item_count = items.len()))]
    pub async fn create(
        &self,
        requester_id: RequesterId,
        requester_name: impl Into<String>,
        items: Vec<OrderLineItem>,
    ) -> Result<Order, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id.clone(),
                variant: item.variant,
            });
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            requester_id,
            requester_name: requester_name.into(),
            items,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            delivery_note: None,
        };

        self.repo.insert(&order).await?;
        Ok(order)
    }

    pub async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
        Ok(self.repo.get(id).await?)
    }

    /// Lists every order, oldest first.
    pub async fn list_all(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.repo.list().await?)
    }

    /// Lists the orders of one requester, oldest first.
    pub async fn list_by_requester(
        &self,
        requester_id: &RequesterId,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.repo.list_by_requester(requester_id).await?)
    }

    pub async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.repo.list().await?;
        orders.retain(|order| order.status == status);
        Ok(orders)
    }

    /// Moves an order to `status`, refreshing `updated_at`.
    ///
    /// A non-blank `delivery_note` replaces the stored note; `None` or a
    /// blank note keeps it.
    #[tracing::instrument(skip(self, delivery_note))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        delivery_note: Option<String>,
    ) -> Result<Order, OrderError> {
        let current = self.repo.get(id).await?.ok_or(OrderError::NotFound(id))?;

        if !self.policy.allows(current.status, status) {
            tracing::warn!(from = %current.status, to = %status, policy = %self.policy, "rejected status transition");
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let delivery_note = delivery_note.filter(|note| !note.trim().is_empty());
        let update = StatusUpdate::new(status)
            .with_note(delivery_note)
            .expect_status(current.status);
        match self.repo.update_status(id, update).await? {
            StatusUpdateOutcome::Updated(order) => Ok(order),
            StatusUpdateOutcome::NotFound => Err(OrderError::NotFound(id)),
            StatusUpdateOutcome::Conflict { actual } => Err(OrderError::StatusChanged {
                order_id: id,
                expected: current.status,
                actual,
            }),
        }
    }

    /// Loads an order and checks that it can still be cancelled.
    pub async fn ensure_cancellable(&self, id: OrderId) -> Result<Order, OrderError> {
        let order = self.repo.get(id).await?.ok_or(OrderError::NotFound(id))?;
        if !order.status.can_cancel() {
            return Err(OrderError::NotCancellable {
                order_id: id,
                status: order.status,
            });
        }
        Ok(order)
    }

    /// Marks a pending order as cancelled.
    ///
    /// The status change is conditional on the order still being pending, so
    /// of several concurrent callers exactly one succeeds. Does not restore
    /// stock; the placement workflow does that once this returns.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<Order, OrderError> {
        self.ensure_cancellable(id).await?;

        let update = StatusUpdate::new(OrderStatus::Cancelled).expect_status(OrderStatus::Pending);
        match self.repo.update_status(id, update).await? {
            StatusUpdateOutcome::Updated(order) => Ok(order),
            StatusUpdateOutcome::NotFound => Err(OrderError::NotFound(id)),
            StatusUpdateOutcome::Conflict { actual } => Err(OrderError::NotCancellable {
                order_id: id,
                status: actual,
            }),
        }
    }

    /// Puts a cancelled order back to pending.
    ///
    /// Bypasses the transition policy. Only the placement workflow uses it,
    /// when a cancellation could not restore the order's stock.
    #[tracing::instrument(skip(self))]
    pub async fn reopen(&self, id: OrderId) -> Result<Order, OrderError> {
        let update = StatusUpdate::new(OrderStatus::Pending).expect_status(OrderStatus::Cancelled);
        match self.repo.update_status(id, update).await? {
            StatusUpdateOutcome::Updated(order) => Ok(order),
            StatusUpdateOutcome::NotFound => Err(OrderError::NotFound(id)),
            StatusUpdateOutcome::Conflict { actual } => Err(OrderError::StatusChanged {
                order_id: id,
                expected: OrderStatus::Cancelled,
                actual,
            }),
        }
    }

    /// Counts orders per status.
    pub async fn stats(&self) -> Result<OrderStats, OrderError> {
        let orders = self.repo.list().await?;
        Ok(OrderStats::from_orders(&orders))
    }
}
