//! Checkout error types.

use std::time::Duration;

use messaging::PublishError;
use order_store::OrderStoreError;
use thiserror::Error;

/// Errors that can occur during a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart had no lines; nothing was charged or written.
    #[error("Cart is empty")]
    EmptyCart,

    /// The cart collaborator could not be reached.
    #[error("Cart service is unavailable: {0}")]
    CartUnavailable(String),

    /// The cart collaborator answered with a non-success status.
    #[error("Cart service returned status {status}")]
    CartRejected { status: u16 },

    /// The cart collaborator's body could not be decoded into lines.
    #[error("Invalid response from cart service: {0}")]
    CartDecode(String),

    /// The charge was refused.
    #[error("Payment declined")]
    PaymentDeclined,

    /// The payment collaborator could not complete the charge.
    #[error("Payment service is unavailable: {0}")]
    PaymentUnavailable(String),

    /// Writing the order failed.
    #[error("Failed to save order: {0}")]
    Persistence(#[from] OrderStoreError),

    /// Broadcasting the order failed.
    #[error("Failed to publish order event: {0}")]
    Publish(#[from] PublishError),

    /// Clearing the cart failed.
    #[error("Failed to clear cart: {0}")]
    ClearCart(String),
}

/// How an error is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request cannot succeed as-is; not retried.
    ClientInput,
    /// A collaborator failed before anything durable happened.
    Collaborator,
    /// The charge was refused or could not be made.
    Payment,
    /// The order could not be written.
    Persistence,
    /// Logged only; never surfaced to the caller.
    BestEffort,
}

impl CheckoutError {
    /// Classifies the error for reporting.
    pub fn class(&self) -> ErrorClass {
        match self {
            CheckoutError::EmptyCart => ErrorClass::ClientInput,
            CheckoutError::CartUnavailable(_)
            | CheckoutError::CartRejected { .. }
            | CheckoutError::CartDecode(_) => ErrorClass::Collaborator,
            CheckoutError::PaymentDeclined | CheckoutError::PaymentUnavailable(_) => {
                ErrorClass::Payment
            }
            CheckoutError::Persistence(_) => ErrorClass::Persistence,
            CheckoutError::Publish(_) | CheckoutError::ClearCart(_) => ErrorClass::BestEffort,
        }
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::EmptyCart => "empty_cart",
            CheckoutError::CartUnavailable(_) => "cart_unavailable",
            CheckoutError::CartRejected { .. } => "cart_rejected",
            CheckoutError::CartDecode(_) => "cart_decode",
            CheckoutError::PaymentDeclined => "payment_declined",
            CheckoutError::PaymentUnavailable(_) => "payment_unavailable",
            CheckoutError::Persistence(_) => "persistence",
            CheckoutError::Publish(_) => "publish",
            CheckoutError::ClearCart(_) => "clear_cart",
        }
    }

    pub(crate) fn timed_out(step: &str, after: Duration) -> String {
        format!("{step} did not respond within {after:?}")
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
