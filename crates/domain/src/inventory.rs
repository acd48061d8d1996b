//! Inventory ledger: the single source of truth for available quantity.

use common::{ProductId, Variant};
use storage::{DeductOutcome, OrderLineItem, StockEntry, StockKey, StockRepository, StorageError};
use thiserror::Error;

/// Reorder threshold given to entries created by a first addition.
pub const DEFAULT_MIN_QUANTITY: u32 = 5;

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Fewer units are available than requested; nothing was deducted.
    #[error("Insufficient stock for {key}: available {available}, requested {requested}")]
    InsufficientStock {
        key: StockKey,
        available: u32,
        requested: u32,
    },

    /// Deductions must be for at least one unit.
    #[error("Invalid amount: {amount} (must be greater than 0)")]
    InvalidAmount { amount: u32 },

    /// No stock entry exists for the key.
    #[error("Stock entry not found: {0}")]
    NotFound(StockKey),

    /// The repository failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A successful deduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduction {
    pub key: StockKey,
    pub amount: u32,
    /// Quantity right before this deduction was applied.
    pub previous: u32,
    pub remaining: u32,
}

/// Service owning per-(product, variant) stock.
///
/// No operation can drive a quantity below zero: quantities are unsigned and
/// deductions are conditional at the repository level.
#[derive(Debug, Clone)]
pub struct InventoryLedger<R: StockRepository> {
    repo: R,
    default_min_quantity: u32,
}

impl<R: StockRepository> InventoryLedger<R> {
    /// Creates a new ledger over the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            default_min_quantity: DEFAULT_MIN_QUANTITY,
        }
    }

    /// Overrides the reorder threshold used for newly created entries.
    pub fn with_default_min_quantity(mut self, min_quantity: u32) -> Self {
        self.default_min_quantity = min_quantity;
        self
    }

    /// Returns the available quantity, 0 when no entry exists.
    pub async fn get_available(
        &self,
        product_id: &ProductId,
        variant: Variant,
    ) -> Result<u32, InventoryError> {
        let key = StockKey::new(product_id.clone(), variant);
        Ok(self.repo.get(&key).await?.map_or(0, |entry| entry.quantity))
    }

    /// Returns the full entry, if any.
    pub async fn get_entry(
        &self,
        product_id: &ProductId,
        variant: Variant,
    ) -> Result<Option<StockEntry>, InventoryError> {
        let key = StockKey::new(product_id.clone(), variant);
        Ok(self.repo.get(&key).await?)
    }

    /// Lists every entry ordered by (product, variant).
    pub async fn list_all(&self) -> Result<Vec<StockEntry>, InventoryError> {
        Ok(self.repo.list().await?)
    }

    /// Lists entries at or below their reorder threshold, ordered by
    /// (product, variant).
    pub async fn list_low_stock(&self) -> Result<Vec<StockEntry>, InventoryError> {
        Ok(self.repo.list_low_stock().await?)
    }

    /// Removes `amount` units.
    ///
    /// Fails without any mutation when fewer than `amount` units are
    /// available.
    #[tracing::instrument(skip(self))]
    pub async fn deduct(
        &self,
        product_id: &ProductId,
        variant: Variant,
        amount: u32,
    ) -> Result<Deduction, InventoryError> {
        if amount == 0 {
            return Err(InventoryError::InvalidAmount { amount });
        }

        let key = StockKey::new(product_id.clone(), variant);
        match self.repo.try_deduct(&key, amount).await? {
            DeductOutcome::Deducted {
                previous,
                remaining,
            } => Ok(Deduction {
                key,
                amount,
                previous,
                remaining,
            }),
            DeductOutcome::Insufficient { available } => Err(InventoryError::InsufficientStock {
                key,
                available,
                requested: amount,
            }),
        }
    }

    /// Adds `amount` units, creating the entry with the default reorder
    /// threshold when it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn add(
        &self,
        product_id: &ProductId,
        variant: Variant,
        amount: u32,
    ) -> Result<StockEntry, InventoryError> {
        let key = StockKey::new(product_id.clone(), variant);
        Ok(self
            .repo
            .add(&key, amount, self.default_min_quantity)
            .await?)
    }

    /// Overwrites the quantity and/or reorder threshold of an existing entry
    /// in one write; either both values change or neither does.
    #[tracing::instrument(skip(self))]
    pub async fn update_levels(
        &self,
        product_id: &ProductId,
        variant: Variant,
        quantity: Option<u32>,
        min_quantity: Option<u32>,
    ) -> Result<StockEntry, InventoryError> {
        let key = StockKey::new(product_id.clone(), variant);
        self.repo
            .update_levels(&key, quantity, min_quantity)
            .await?
            .ok_or(InventoryError::NotFound(key))
    }

    /// Adds back every line item, e.g. when an order is cancelled.
    ///
    /// All or nothing: if one addition fails, the additions already made are
    /// deducted again before the error is returned.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn restore(&self, items: &[OrderLineItem]) -> Result<(), InventoryError> {
        let mut restored: Vec<&OrderLineItem> = Vec::with_capacity(items.len());

        for item in items {
            match self.add(&item.product_id, item.variant, item.quantity).await {
                Ok(_) => restored.push(item),
                Err(e) => {
                    for done in restored.iter().rev() {
                        let key = done.key();
                        match self.repo.try_deduct(&key, done.quantity).await {
                            Ok(DeductOutcome::Deducted { .. }) => {}
                            Ok(DeductOutcome::Insufficient { available }) => {
                                tracing::error!(%key, available, requested = done.quantity, "restored stock already consumed, partial restore not undone");
                            }
                            Err(undo) => {
                                tracing::error!(%key, error = %undo, "failed to undo partial restore");
                            }
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}
