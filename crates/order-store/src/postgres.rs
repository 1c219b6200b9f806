use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, VerifiedIdentity};
use domain::{CartLine, Order, OrderStatus};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderStoreError, Result,
    store::{OrderStore, validate_lines_for_create},
};

/// PostgreSQL-backed order store implementation.
///
/// Line items are kept in a JSONB column in the order they were read from
/// the cart; the identifier is assigned by the database.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool, giving up after `connect_timeout`.
    pub async fn connect(database_url: &str, connect_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let id: Uuid = row.try_get("id")?;
        let items: serde_json::Value = row.try_get("items")?;
        let lines: Vec<CartLine> = serde_json::from_value(items)?;
        let status: String = row.try_get("status")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        let corrupt = |reason: String| OrderStoreError::CorruptRecord {
            id: id.to_string(),
            reason,
        };

        let status =
            OrderStatus::parse(&status).ok_or_else(|| corrupt(format!("unknown status {status}")))?;

        let mut order = Order::new(
            OrderId::from_uuid(id),
            VerifiedIdentity::new(row.try_get::<String, _>("user_email")?),
            lines,
            created_at,
        )
        .map_err(|e| corrupt(e.to_string()))?;
        order.status = status;
        Ok(order)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_order(&self, owner: &VerifiedIdentity, lines: Vec<CartLine>) -> Result<Order> {
        validate_lines_for_create(&lines)?;

        let items = serde_json::to_value(&lines)?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (user_email, items, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_email, items, status, created_at
            "#,
        )
        .bind(owner.as_str())
        .bind(items)
        .bind(OrderStatus::Created.as_str())
        .fetch_one(&self.pool)
        .await?;

        let order = Self::row_to_order(row)?;
        tracing::debug!(order_id = %order.id, owner = %owner, "order row inserted");
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_email, items, status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders_for_owner(&self, owner: &VerifiedIdentity) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_email, items, status, created_at
            FROM orders
            WHERE user_email = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
