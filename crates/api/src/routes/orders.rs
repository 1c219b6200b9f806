//! Order history endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::Order;

use crate::AppState;
use crate::auth::Authenticated;
use crate::error::ApiError;

/// GET /orders: the caller's orders, newest first.
#[tracing::instrument(skip(state, caller), fields(owner = %caller.identity))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .orchestrator
        .collaborators()
        .orders
        .list_orders_for_owner(&caller.identity)
        .await?;

    tracing::debug!(count = orders.len(), "orders listed");
    Ok(Json(orders))
}
