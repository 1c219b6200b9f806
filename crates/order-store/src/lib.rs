//! Durable storage for orders created at checkout.
//!
//! The [`OrderStore`] trait is the seam the checkout orchestrator writes
//! through; [`InMemoryOrderStore`] backs tests and local runs and
//! [`PostgresOrderStore`] is the production implementation.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{OrderStoreError, Result};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;
