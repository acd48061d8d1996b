//! Domain layer for the perfume distribution service.
//!
//! This crate provides the services that own persisted state:
//! - `InventoryLedger` for per-(product, variant) stock
//! - `OrderStore` for orders and their status lifecycle
//! - `Catalog` for perfume records
//! - `reports` for order statistics and sales summaries

pub mod catalog;
pub mod inventory;
pub mod order;
pub mod reports;

pub use catalog::{Catalog, CatalogError, NewPerfume};
pub use inventory::{DEFAULT_MIN_QUANTITY, Deduction, InventoryError, InventoryLedger};
pub use order::{OrderError, OrderStore, ParsePolicyError, TransitionPolicy};
pub use reports::{OrderStats, ProductSales, RequesterOrders, Reports};
