//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, ErrorClass};
use order_store::OrderStoreError;

use crate::auth::AuthError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid credentials.
    Unauthorized(AuthError),
    /// A checkout that did not complete.
    Checkout(CheckoutError),
    /// Reading orders failed.
    Store(OrderStoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "failed to read orders");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to retrieve orders".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match err.class() {
        ErrorClass::ClientInput => (StatusCode::BAD_REQUEST, err.to_string()),
        ErrorClass::Payment => (StatusCode::SERVICE_UNAVAILABLE, "Payment failed".to_string()),
        ErrorClass::Collaborator => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Could not retrieve cart".to_string(),
        ),
        ErrorClass::Persistence => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create order".to_string(),
        ),
        // Not returned by a checkout.
        ErrorClass::BestEffort => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<OrderStoreError> for ApiError {
    fn from(err: OrderStoreError) -> Self {
        ApiError::Store(err)
    }
}
