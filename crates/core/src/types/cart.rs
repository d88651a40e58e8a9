//! Cart line items and the arithmetic derived from them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{CartLineId, ProductId};

/// One product-and-quantity entry in a cart.
///
/// The unit price is a snapshot taken when the product was added; later
/// catalog price changes do not affect lines already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    /// Product name for display, when known.
    #[serde(default)]
    pub name: Option<String>,
    pub unit_price: Decimal,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of line totals; zero for an empty cart.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Sum of quantities (the badge number), not the number of lines.
#[must_use]
pub fn cart_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn line(id: i32, price: &str, quantity: u32) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            product_id: ProductId::new(id),
            name: None,
            unit_price: price.parse().unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line(1, "199.99", 2).line_total(), "399.98".parse().unwrap());
    }

    #[test]
    fn test_empty_cart_totals() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
        assert_eq!(cart_count(&[]), 0);
    }

    #[test]
    fn test_count_is_quantity_not_lines() {
        let lines = [line(1, "10.00", 3), line(2, "5.50", 2)];
        assert_eq!(cart_count(&lines), 5);
        assert_eq!(cart_total(&lines), "41.00".parse().unwrap());
    }

    proptest! {
        #[test]
        fn prop_totals_match_per_line_sums(
            entries in prop::collection::vec((1i64..1_000_000, 1u32..100), 0..20)
        ) {
            let lines: Vec<CartLine> = entries
                .iter()
                .enumerate()
                .map(|(i, (cents, qty))| CartLine {
                    id: CartLineId::new(i32::try_from(i).unwrap()),
                    product_id: ProductId::new(i32::try_from(i).unwrap()),
                    name: None,
                    unit_price: Decimal::new(*cents, 2),
                    quantity: *qty,
                })
                .collect();

            let expected_total: Decimal = entries
                .iter()
                .map(|(cents, qty)| Decimal::new(*cents, 2) * Decimal::from(*qty))
                .sum();
            let expected_count: u64 = entries.iter().map(|(_, qty)| u64::from(*qty)).sum();

            prop_assert_eq!(cart_total(&lines), expected_total);
            prop_assert_eq!(cart_count(&lines), expected_count);
        }
    }
}
