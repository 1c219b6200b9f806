//! Collaborator traits and their implementations.

pub mod cart;
pub mod payment;

pub use cart::{CartFailure, CartService, HttpCartClient, InMemoryCartService};
pub use payment::{PaymentService, StubPaymentService};
