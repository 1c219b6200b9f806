//! The persisted order record.

use chrono::{DateTime, Utc};
use common::{OrderId, VerifiedIdentity};
use serde::{Deserialize, Serialize};

use super::OrderError;
use super::line::CartLine;
use super::state::OrderStatus;
use super::value_objects::Money;

/// An order created by a successful checkout.
///
/// The line sequence keeps the order in which the cart reported it and is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "userEmail")]
    pub owner: VerifiedIdentity,
    #[serde(rename = "items")]
    pub lines: Vec<CartLine>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Assembles an order around an identifier assigned by storage.
    pub fn new(
        id: OrderId,
        owner: VerifiedIdentity,
        lines: Vec<CartLine>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::NoItems);
        }
        if Money::checked_sum(lines.iter().map(|line| line.line_total)).is_none() {
            return Err(OrderError::AmountOutOfRange);
        }
        Ok(Self {
            id,
            owner,
            lines,
            status: OrderStatus::Created,
            created_at,
        })
    }

    /// Sum of all line totals, or `None` if it overflows.
    ///
    /// Always `Some` for orders built through [`Order::new`]; a decoded
    /// order may carry arbitrary totals.
    pub fn total(&self) -> Option<Money> {
        Money::checked_sum(self.lines.iter().map(|line| line.line_total))
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}
