//! Orders, cart lines and the event announcing a new order.

mod entity;
mod events;
mod line;
mod state;
mod value_objects;

pub use entity::Order;
pub use events::OrderCreatedEvent;
pub use line::CartLine;
pub use state::OrderStatus;
pub use value_objects::{Money, ProductId};

use thiserror::Error;

/// Errors raised when building order values.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: i64 },

    /// Invalid price.
    #[error("Invalid price: {price} cents (must not be negative)")]
    InvalidPrice { price: i64 },

    /// A price or total does not fit in the cent range.
    #[error("Amount out of range")]
    AmountOutOfRange,

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,
}
