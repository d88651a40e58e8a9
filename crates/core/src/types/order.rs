//! Orders produced by a successful checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::cart::{CartLine, cart_count, cart_total};
use crate::types::id::OrderId;
use crate::types::price::{CurrencyCode, Price};
use crate::types::status::PaymentMethod;

/// A submitted order.
///
/// Holds a snapshot of the cart at submission time; it is never mutated
/// after creation, so the cart may be cleared or changed freely afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub lines: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub total: Price,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create an order from a cart snapshot, stamping it with the current time.
    #[must_use]
    pub fn new(
        lines: Vec<CartLine>,
        payment_method: PaymentMethod,
        shipping_address: impl Into<String>,
        currency_code: CurrencyCode,
    ) -> Self {
        let total = Price::new(cart_total(&lines), currency_code);
        Self {
            id: OrderId::generate(),
            lines,
            payment_method,
            shipping_address: shipping_address.into(),
            total,
            created_at: Utc::now(),
        }
    }

    /// Total number of units ordered.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        cart_count(&self.lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::id::{CartLineId, ProductId};

    #[test]
    fn test_order_snapshots_total() {
        let lines = vec![
            CartLine {
                id: CartLineId::new(1),
                product_id: ProductId::new(1),
                name: Some("Smartphone Pro Max".to_string()),
                unit_price: "999.99".parse().unwrap(),
                quantity: 1,
            },
            CartLine {
                id: CartLineId::new(2),
                product_id: ProductId::new(5),
                name: None,
                unit_price: "29.99".parse().unwrap(),
                quantity: 3,
            },
        ];

        let order = Order::new(lines, PaymentMethod::Card, "12 Main St", CurrencyCode::USD);
        assert_eq!(order.total.amount, "1089.96".parse::<Decimal>().unwrap());
        assert_eq!(order.total.currency_code, CurrencyCode::USD);
        assert_eq!(order.item_count(), 4);
        assert_eq!(order.shipping_address, "12 Main St");
    }
}
