use async_trait::async_trait;
use common::{OrderId, VerifiedIdentity};
use domain::{CartLine, Order};

use crate::{OrderStoreError, Result};

/// Core trait for order storage implementations.
///
/// The store owns identifier assignment: callers hand over the owner and
/// the lines, and get back the order exactly as it was persisted.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order with status `Created` and returns it.
    ///
    /// Fails with [`OrderStoreError::EmptyOrder`] when `lines` is empty;
    /// nothing is written in that case.
    async fn create_order(&self, owner: &VerifiedIdentity, lines: Vec<CartLine>) -> Result<Order>;

    /// Retrieves a single order by its identifier.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Retrieves every order placed by `owner`, newest first.
    async fn list_orders_for_owner(&self, owner: &VerifiedIdentity) -> Result<Vec<Order>>;
}

/// Validates lines before they are written.
pub fn validate_lines_for_create(lines: &[CartLine]) -> Result<()> {
    if lines.is_empty() {
        return Err(OrderStoreError::EmptyOrder);
    }
    Ok(())
}
