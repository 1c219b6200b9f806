//! Order status.

use serde::{Deserialize, Serialize};

/// The status of a persisted order.
///
/// Orders are written once at checkout and never transition afterwards,
/// so `Created` is the only status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// The order has been persisted after a successful charge.
    #[default]
    Created,
}

impl OrderStatus {
    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
        }
    }

    /// Parses a stored status name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Created" => Some(OrderStatus::Created),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
