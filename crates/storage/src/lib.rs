//! Persistence for the perfume distribution service.
//!
//! Repositories are defined as traits with two implementations each:
//! an in-memory one for tests and single-process deployments, and a
//! PostgreSQL one backed by `sqlx`.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod repository;

pub use error::{Result, StorageError};
pub use memory::{InMemoryOrderRepository, InMemoryPerfumeRepository, InMemoryStockRepository};
pub use postgres::{
    PostgresOrderRepository, PostgresPerfumeRepository, PostgresRepositories,
    PostgresStockRepository,
};
pub use record::{Order, OrderLineItem, Perfume, StockEntry, StockKey};
pub use repository::{
    DeductOutcome, OrderRepository, PerfumeRepository, StatusUpdate, StatusUpdateOutcome,
    StockRepository,
};
