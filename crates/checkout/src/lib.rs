//! Checkout orchestration.
//!
//! One checkout runs these steps strictly in order:
//! 1. Read the caller's cart
//! 2. Charge the caller
//! 3. Persist the order
//! 4. Broadcast `order_created`
//! 5. Clear the cart
//!
//! Steps 1-3 can abort the checkout; nothing durable has happened before
//! step 3 succeeds. Steps 4 and 5 are best effort: their failures are
//! logged as critical and the checkout still succeeds. There is no retry
//! and no compensation.

pub mod coordinator;
pub mod error;
pub mod services;
pub mod state;

pub use coordinator::{CheckoutOrchestrator, CheckoutOutcome, Collaborators, DEFAULT_CALL_TIMEOUT};
pub use error::{CheckoutError, ErrorClass, Result};
pub use services::{
    CartFailure, CartService, HttpCartClient, InMemoryCartService, PaymentService,
    StubPaymentService,
};
pub use state::CheckoutState;
