//! Log of applied deductions, used to undo a partial placement.

use domain::{Deduction, InventoryLedger};
use storage::{StockKey, StockRepository};

/// One applied deduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub key: StockKey,
    pub amount: u32,
    /// Quantity right before the deduction.
    pub previous: u32,
}

impl From<Deduction> for Reservation {
    fn from(d: Deduction) -> Self {
        Self {
            key: d.key,
            amount: d.amount,
            previous: d.previous,
        }
    }
}

/// Deductions applied so far, in the order they happened.
#[derive(Debug, Clone, Default)]
pub struct ReservationLog {
    entries: Vec<Reservation>,
}

impl ReservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reservation: impl Into<Reservation>) {
        self.entries.push(reservation.into());
    }

    pub fn entries(&self) -> &[Reservation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds back every recorded amount, newest first, and clears the log.
    ///
    /// A failed addition is logged and skipped so the remaining entries are
    /// still restored. Returns the entries that could not be restored.
    #[tracing::instrument(skip_all, fields(entries = self.entries.len()))]
    pub async fn compensate<R: StockRepository>(
        &mut self,
        ledger: &InventoryLedger<R>,
    ) -> Vec<Reservation> {
        let mut failed = Vec::new();
        if self.entries.is_empty() {
            return failed;
        }

        metrics::counter!("stock_compensations_total").increment(1);

        while let Some(reservation) = self.entries.pop() {
            let Reservation { key, amount, .. } = &reservation;
            match ledger.add(&key.product_id, key.variant, *amount).await {
                Ok(entry) => {
                    tracing::debug!(%key, amount, quantity = entry.quantity, "restored reserved stock");
                }
                Err(e) => {
                    tracing::error!(%key, amount, error = %e, "failed to restore reserved stock");
                    failed.push(reservation);
                }
            }
        }

        failed
    }
}

#[cfg(test)]
mod tests {
    use common::{ProductId, Variant};
    use storage::{InMemoryStockRepository, StockEntry};

    use super::*;

    #[tokio::test]
    async fn test_compensate_restores_every_entry() {
        let ledger = InventoryLedger::new(InMemoryStockRepository::with_entries([
            StockEntry::new(StockKey::new("P1", Variant::Ml30), 50, 10),
            StockEntry::new(StockKey::new("P2", Variant::Ml50), 20, 5),
        ]));

        let mut log = ReservationLog::new();
        log.record(
            ledger
                .deduct(&ProductId::new("P1"), Variant::Ml30, 5)
                .await
                .unwrap(),
        );
        log.record(
            ledger
                .deduct(&ProductId::new("P2"), Variant::Ml50, 20)
                .await
                .unwrap(),
        );
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].previous, 50);

        let failed = log.compensate(&ledger).await;
        assert!(failed.is_empty());
        assert!(log.is_empty());
        assert_eq!(
            ledger.get_available(&ProductId::new("P1"), Variant::Ml30).await.unwrap(),
            50
        );
        assert_eq!(
            ledger.get_available(&ProductId::new("P2"), Variant::Ml50).await.unwrap(),
            20
        );
    }

    #[tokio::test]
    async fn test_compensate_empty_log_is_noop() {
        let ledger = InventoryLedger::new(InMemoryStockRepository::new());
        let mut log = ReservationLog::new();
        assert!(log.compensate(&ledger).await.is_empty());
        assert_eq!(ledger.list_all().await.unwrap().len(), 0);
    }
}
