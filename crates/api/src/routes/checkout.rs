//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::Order;

use crate::AppState;
use crate::auth::Authenticated;
use crate::error::ApiError;

/// POST /checkout: turns the caller's cart into an order.
///
/// No request body is read; the cart is looked up server-side.
#[tracing::instrument(skip(state, caller), fields(owner = %caller.identity))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let outcome = state
        .orchestrator
        .checkout(&caller.identity, &caller.credential)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome.order)))
}
