use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus, ProductId, RequesterId, Variant};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Order, OrderLineItem, Perfume, Result, StockEntry, StockKey, StorageError,
    repository::{
        DeductOutcome, OrderRepository, PerfumeRepository, StatusUpdate, StatusUpdateOutcome,
        StockRepository,
    },
};

/// Connection pool shared by the PostgreSQL repositories.
#[derive(Clone)]
pub struct PostgresRepositories {
    pool: PgPool,
}

impl PostgresRepositories {
    /// Wraps an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::debug!("migrations applied");
        Ok(())
    }

    pub fn stock(&self) -> PostgresStockRepository {
        PostgresStockRepository {
            pool: self.pool.clone(),
        }
    }

    pub fn orders(&self) -> PostgresOrderRepository {
        PostgresOrderRepository {
            pool: self.pool.clone(),
        }
    }

    pub fn perfumes(&self) -> PostgresPerfumeRepository {
        PostgresPerfumeRepository {
            pool: self.pool.clone(),
        }
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StorageError::Corrupt(format!("{column} out of range: {value}")))
}

fn parse_variant(value: &str) -> Result<Variant> {
    value
        .parse()
        .map_err(|e: common::ParseVariantError| StorageError::Corrupt(e.to_string()))
}

fn parse_status(value: &str) -> Result<OrderStatus> {
    value
        .parse()
        .map_err(|e: common::ParseStatusError| StorageError::Corrupt(e.to_string()))
}

fn map_unique_violation(e: sqlx::Error, what: String) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StorageError::Duplicate(what);
    }
    StorageError::Database(e)
}

/// PostgreSQL-backed stock repository.
#[derive(Clone)]
pub struct PostgresStockRepository {
    pool: PgPool,
}

impl PostgresStockRepository {
    fn row_to_entry(row: PgRow) -> Result<StockEntry> {
        let product_id: String = row.try_get("product_id")?;
        let variant: String = row.try_get("variant")?;
        Ok(StockEntry {
            product_id: ProductId::new(product_id),
            variant: parse_variant(&variant)?,
            quantity: to_u32(row.try_get("quantity")?, "quantity")?,
            min_quantity: to_u32(row.try_get("min_quantity")?, "min_quantity")?,
        })
    }
}

#[async_trait]
impl StockRepository for PostgresStockRepository {
    async fn get(&self, key: &StockKey) -> Result<Option<StockEntry>> {
        let row = sqlx::query(
            r#"
            SELECT product_id, variant, quantity, min_quantity
            FROM stock_entries
            WHERE product_id = $1 AND variant = $2
            "#,
        )
        .bind(key.product_id.as_str())
        .bind(key.variant.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_entry).transpose()
    }

    async fn list(&self) -> Result<Vec<StockEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, variant, quantity, min_quantity
            FROM stock_entries
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        // Variant ordering is by size, not by its text form.
        let mut entries = rows
            .into_iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(StockEntry::key);
        Ok(entries)
    }

    async fn list_low_stock(&self) -> Result<Vec<StockEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, variant, quantity, min_quantity
            FROM stock_entries
            WHERE quantity <= min_quantity
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = rows
            .into_iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(StockEntry::key);
        Ok(entries)
    }

    async fn try_deduct(&self, key: &StockKey, amount: u32) -> Result<DeductOutcome> {
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE stock_entries
            SET quantity = quantity - $3
            WHERE product_id = $1 AND variant = $2 AND quantity >= $3
            RETURNING quantity
            "#,
        )
        .bind(key.product_id.as_str())
        .bind(key.variant.as_str())
        .bind(i64::from(amount))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining) = remaining {
            let remaining = to_u32(remaining, "quantity")?;
            return Ok(DeductOutcome::Deducted {
                previous: remaining.saturating_add(amount),
                remaining,
            });
        }

        let available = self.get(key).await?.map_or(0, |entry| entry.quantity);
        tracing::debug!(%key, amount, available, "conditional deduction matched no row");
        Ok(DeductOutcome::Insufficient { available })
    }

    async fn add(
        &self,
        key: &StockKey,
        amount: u32,
        default_min_quantity: u32,
    ) -> Result<StockEntry> {
        let row = sqlx::query(
            r#"
            INSERT INTO stock_entries (product_id, variant, quantity, min_quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id, variant) DO UPDATE SET
                quantity = LEAST(stock_entries.quantity + EXCLUDED.quantity, 4294967295)
            RETURNING product_id, variant, quantity, min_quantity
            "#,
        )
        .bind(key.product_id.as_str())
        .bind(key.variant.as_str())
        .bind(i64::from(amount))
        .bind(i64::from(default_min_quantity))
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_entry(row)
    }

    async fn update_levels(
        &self,
        key: &StockKey,
        quantity: Option<u32>,
        min_quantity: Option<u32>,
    ) -> Result<Option<StockEntry>> {
        let row = sqlx::query(
            r#"
            UPDATE stock_entries
            SET quantity = COALESCE($3, quantity), min_quantity = COALESCE($4, min_quantity)
            WHERE product_id = $1 AND variant = $2
            RETURNING product_id, variant, quantity, min_quantity
            "#,
        )
        .bind(key.product_id.as_str())
        .bind(key.variant.as_str())
        .bind(quantity.map(i64::from))
        .bind(min_quantity.map(i64::from))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_entry).transpose()
    }
}

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    fn row_to_item(row: &PgRow) -> Result<(Uuid, OrderLineItem)> {
        let order_id: Uuid = row.try_get("order_id")?;
        let product_id: String = row.try_get("product_id")?;
        let variant: String = row.try_get("variant")?;
        Ok((
            order_id,
            OrderLineItem {
                product_id: ProductId::new(product_id),
                variant: parse_variant(&variant)?,
                quantity: to_u32(row.try_get("quantity")?, "quantity")?,
                product_name: row.try_get("product_name")?,
            },
        ))
    }

    /// Attaches line items to order rows, preserving the row order.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let item_rows = sqlx::query(
            r#"
            SELECT order_id, product_id, variant, quantity, product_name
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderLineItem>> = HashMap::new();
        for row in &item_rows {
            let (order_id, item) = Self::row_to_item(row)?;
            items.entry(order_id).or_default().push(item);
        }

        rows.into_iter()
            .map(|row| -> Result<Order> {
                let id: Uuid = row.try_get("id")?;
                let requester_id: String = row.try_get("requester_id")?;
                let status: String = row.try_get("status")?;
                Ok(Order {
                    id: OrderId::from_uuid(id),
                    requester_id: RequesterId::new(requester_id),
                    requester_name: row.try_get("requester_name")?,
                    items: items.remove(&id).unwrap_or_default(),
                    status: parse_status(&status)?,
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                    updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
                    delivery_note: row.try_get("delivery_note")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, requester_id, requester_name, status, created_at, updated_at, delivery_note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.requester_id.as_str())
        .bind(&order.requester_name)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(&order.delivery_note)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, format!("order {}", order.id)))?;

        for (position, item) in order.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StorageError::Corrupt(format!("too many items in {}", order.id)))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, variant, quantity, product_name)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position)
            .bind(item.product_id.as_str())
            .bind(item.variant.as_str())
            .bind(i64::from(item.quantity))
            .bind(&item.product_name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, requester_id, requester_name, status, created_at, updated_at, delivery_note
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(self.hydrate(rows).await?.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, requester_id, requester_name, status, created_at, updated_at, delivery_note
            FROM orders
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn list_by_requester(&self, requester_id: &RequesterId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, requester_id, requester_name, status, created_at, updated_at, delivery_note
            FROM orders
            WHERE requester_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(requester_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn update_status(
        &self,
        id: OrderId,
        update: StatusUpdate,
    ) -> Result<StatusUpdateOutcome> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET status = $2, updated_at = $3, delivery_note = COALESCE($4, delivery_note)
            WHERE id = $1 AND ($5::TEXT IS NULL OR status = $5)
            RETURNING id
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.status.as_str())
        .bind(update.updated_at)
        .bind(&update.delivery_note)
        .bind(update.expected_status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_none() {
            let actual: Option<String> =
                sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;

            return match actual {
                Some(status) => Ok(StatusUpdateOutcome::Conflict {
                    actual: parse_status(&status)?,
                }),
                None => Ok(StatusUpdateOutcome::NotFound),
            };
        }

        match self.get(id).await? {
            Some(order) => Ok(StatusUpdateOutcome::Updated(order)),
            None => Ok(StatusUpdateOutcome::NotFound),
        }
    }
}

/// PostgreSQL-backed perfume catalog.
#[derive(Clone)]
pub struct PostgresPerfumeRepository {
    pool: PgPool,
}

impl PostgresPerfumeRepository {
    fn row_to_perfume(row: PgRow) -> Result<Perfume> {
        let id: String = row.try_get("id")?;
        Ok(Perfume {
            id: ProductId::new(id),
            name: row.try_get("name")?,
            brand: row.try_get("brand")?,
            description: row.try_get("description")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

#[async_trait]
impl PerfumeRepository for PostgresPerfumeRepository {
    async fn insert(&self, perfume: &Perfume) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO perfumes (id, name, brand, description, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(perfume.id.as_str())
        .bind(&perfume.name)
        .bind(&perfume.brand)
        .bind(&perfume.description)
        .bind(perfume.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("perfume {}", perfume.id)))?;

        Ok(())
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Perfume>> {
        let row = sqlx::query(
            "SELECT id, name, brand, description, is_active FROM perfumes WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_perfume).transpose()
    }

    async fn list(&self) -> Result<Vec<Perfume>> {
        let rows = sqlx::query(
            "SELECT id, name, brand, description, is_active FROM perfumes ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_perfume).collect()
    }

    async fn set_active(&self, id: &ProductId, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE perfumes SET is_active = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(active)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
