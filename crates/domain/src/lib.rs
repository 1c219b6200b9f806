//! Domain types for the checkout service.
//!
//! - `CartLine`: a validated cart entry with a derived line total
//! - `Order`: the record written once per successful checkout
//! - `OrderCreatedEvent`: the broadcast copy of a new order

pub mod order;

pub use order::{
    CartLine, Money, Order, OrderCreatedEvent, OrderError, OrderStatus, ProductId,
};
