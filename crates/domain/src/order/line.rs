//! Cart lines as reported by the cart collaborator and copied into orders.

use serde::{Deserialize, Serialize};

use super::OrderError;
use super::value_objects::{Money, ProductId};

/// One product in a cart, enriched with catalog name and price.
///
/// Lines are validated when they are built or decoded: the quantity is
/// always positive and the unit price never negative. `line_total` is
/// derived from the other two and never taken from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CartLineWire")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub name: String,
    pub sku: String,
    #[serde(rename = "price")]
    pub unit_price: Money,
    pub line_total: Money,
}

impl CartLine {
    /// Builds a validated line.
    pub fn new(
        product_id: impl Into<ProductId>,
        sku: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: i64::from(quantity),
            });
        }
        if unit_price.is_negative() {
            return Err(OrderError::InvalidPrice {
                price: unit_price.cents(),
            });
        }
        let line_total = unit_price
            .checked_multiply(quantity)
            .ok_or(OrderError::AmountOutOfRange)?;
        Ok(Self {
            product_id: product_id.into(),
            quantity,
            name: name.into(),
            sku: sku.into(),
            unit_price,
            line_total,
        })
    }
}

/// Shape accepted from the cart collaborator before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartLineWire {
    product_id: String,
    quantity: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    sku: String,
    price: f64,
}

impl TryFrom<CartLineWire> for CartLine {
    type Error = OrderError;

    fn try_from(wire: CartLineWire) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(wire.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(OrderError::InvalidQuantity {
                quantity: wire.quantity,
            })?;
        CartLine::new(
            wire.product_id,
            wire.sku,
            wire.name,
            quantity,
            Money::try_from(wire.price)?,
        )
    }
}
