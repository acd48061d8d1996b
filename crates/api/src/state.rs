//! Shared application state and its composition root.

use std::sync::Arc;

use domain::{Catalog, InventoryLedger, OrderStore, Reports};
use placement::OrderPlacementWorkflow;
use storage::{
    InMemoryOrderRepository, InMemoryPerfumeRepository, InMemoryStockRepository, OrderRepository,
    PerfumeRepository, PostgresRepositories, StockRepository, StorageError,
};

use crate::config::Config;

pub type SharedStock = Arc<dyn StockRepository>;
pub type SharedOrders = Arc<dyn OrderRepository>;
pub type SharedPerfumes = Arc<dyn PerfumeRepository>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub workflow: OrderPlacementWorkflow<SharedStock, SharedOrders, SharedPerfumes>,
    pub reports: Reports<SharedOrders>,
    /// Name of the storage backend, reported by `/health`.
    pub backend: &'static str,
}

impl AppState {
    /// Wires the services over the given repositories.
    pub fn new(
        config: &Config,
        stock: SharedStock,
        orders: SharedOrders,
        perfumes: SharedPerfumes,
        backend: &'static str,
    ) -> Self {
        let ledger =
            InventoryLedger::new(stock).with_default_min_quantity(config.default_min_quantity);
        let store = OrderStore::new(orders.clone()).with_policy(config.transition_policy);
        let catalog = Catalog::new(perfumes);

        Self {
            workflow: OrderPlacementWorkflow::new(ledger, store, catalog),
            reports: Reports::new(orders),
            backend,
        }
    }

    pub fn ledger(&self) -> &InventoryLedger<SharedStock> {
        self.workflow.ledger()
    }

    pub fn orders(&self) -> &OrderStore<SharedOrders> {
        self.workflow.store()
    }

    pub fn catalog(&self) -> &Catalog<SharedPerfumes> {
        self.workflow.catalog()
    }
}

/// Creates application state backed by in-memory repositories.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    Arc::new(AppState::new(
        config,
        Arc::new(InMemoryStockRepository::new()),
        Arc::new(InMemoryOrderRepository::new()),
        Arc::new(InMemoryPerfumeRepository::new()),
        "memory",
    ))
}

/// Connects to PostgreSQL, applies the schema and creates application state
/// backed by it.
pub async fn create_postgres_state(
    config: &Config,
    database_url: &str,
) -> Result<Arc<AppState>, StorageError> {
    let repos = PostgresRepositories::connect(database_url, config.database_max_connections).await?;
    repos.run_migrations().await?;
    tracing::info!("connected to PostgreSQL, schema up to date");

    Ok(Arc::new(AppState::new(
        config,
        Arc::new(repos.stock()),
        Arc::new(repos.orders()),
        Arc::new(repos.perfumes()),
        "postgres",
    )))
}
