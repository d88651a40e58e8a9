//! In-memory cart for anonymous shoppers.

use rust_decimal::Decimal;

use anufa_core::{CartLine, CartLineId, Product, ProductId};

use super::{CartStore, MAX_LINE_QUANTITY, not_in_cart, validate_quantity};
use crate::error::{StorefrontError, ValidationError};

/// A cart that lives only in this process. Line IDs are assigned
/// sequentially and never reused.
#[derive(Debug, Clone, Default)]
pub struct LocalCart {
    lines: Vec<CartLine>,
    next_line_id: i32,
}

impl LocalCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
        name: Option<&str>,
    ) -> Result<(), StorefrontError> {
        let quantity = validate_quantity(quantity)?;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            let combined = line
                .quantity
                .checked_add(quantity)
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or(ValidationError::QuantityTooLarge {
                    max: MAX_LINE_QUANTITY,
                })?;
            line.quantity = combined;
            if line.name.is_none() {
                line.name = name.map(str::to_string);
            }
            return Ok(());
        }

        self.next_line_id += 1;
        self.lines.push(CartLine {
            id: CartLineId::new(self.next_line_id),
            product_id,
            name: name.map(str::to_string),
            unit_price,
            quantity,
        });
        Ok(())
    }
}

impl CartStore for LocalCart {
    async fn add_item(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<(), StorefrontError> {
        self.insert(product_id, unit_price, quantity, None)
    }

    async fn add_product(&mut self, product: &Product, quantity: u32) -> Result<(), StorefrontError> {
        self.insert(product.id, product.price, quantity, Some(product.name.as_str()))
    }

    async fn remove_item(&mut self, line_id: CartLineId) -> Result<(), StorefrontError> {
        self.lines.retain(|line| line.id != line_id);
        Ok(())
    }

    async fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), StorefrontError> {
        let quantity = validate_quantity(quantity)?;
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or_else(|| not_in_cart(product_id))?;
        line.quantity = quantity;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), StorefrontError> {
        self.lines.clear();
        Ok(())
    }

    fn lines(&self) -> &[CartLine] {
        &self.lines
    }
}
