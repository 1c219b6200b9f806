use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, VerifiedIdentity};
use domain::{CartLine, Order};
use tokio::sync::RwLock;

use crate::{
    OrderStoreError, Result,
    store::{OrderStore, validate_lines_for_create},
};

/// In-memory order store implementation for testing and local runs.
///
/// Provides the same interface as the PostgreSQL implementation. Writes
/// can be switched to fail to exercise the persistence-failure path.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create_order` fail until switched back.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, owner: &VerifiedIdentity, lines: Vec<CartLine>) -> Result<Order> {
        validate_lines_for_create(&lines)?;

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(OrderStoreError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }

        let order = Order::new(OrderId::new(), owner.clone(), lines, Utc::now())
            .map_err(|_| OrderStoreError::EmptyOrder)?;

        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_for_owner(&self, owner: &VerifiedIdentity) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        // Insertion order is creation order; reverse for newest first.
        Ok(orders
            .iter()
            .rev()
            .filter(|o| &o.owner == owner)
            .cloned()
            .collect())
    }
}
