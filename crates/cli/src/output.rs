//! Plain-text rendering of catalog, cart and order data.
//!
//! Every price goes through the configured [`CurrencyFormatter`].

use std::io::Write;

use anufa_core::{CartLine, Category, CurrencyFormatter, DataSource, Order, Product};
use anufa_storefront::services::checkout::CheckoutState;

use crate::error::CliError;

pub fn source_note(out: &mut impl Write, source: DataSource) -> Result<(), CliError> {
    if !source.is_live() {
        writeln!(out, "(demo data: the store could not be reached)")?;
    }
    Ok(())
}

pub fn products<'a>(
    out: &mut impl Write,
    formatter: &CurrencyFormatter,
    products: impl IntoIterator<Item = &'a Product>,
) -> Result<(), CliError> {
    let mut shown = 0;
    for product in products {
        let price = formatter.format(product.price)?;
        let marker = if product.is_featured { " *" } else { "" };
        writeln!(out, "{:>5}  {:<36} {:>14}{marker}", product.id.as_i32(), product.name, price)?;
        shown += 1;
    }
    if shown == 0 {
        writeln!(out, "No products found")?;
    }
    Ok(())
}

pub fn product_detail(
    out: &mut impl Write,
    formatter: &CurrencyFormatter,
    product: &Product,
) -> Result<(), CliError> {
    writeln!(out, "{} (#{})", product.name, product.id)?;
    writeln!(out, "Price:    {}", formatter.format(product.price)?)?;
    if let Some(category) = &product.category_name {
        writeln!(out, "Category: {category}")?;
    }
    if let Some(stock) = product.stock_quantity {
        writeln!(out, "In stock: {stock}")?;
    }
    if !product.description().is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", product.description())?;
    }
    Ok(())
}

pub fn categories(out: &mut impl Write, categories: &[Category]) -> Result<(), CliError> {
    if categories.is_empty() {
        writeln!(out, "No categories found")?;
    }
    for category in categories {
        writeln!(out, "{:>5}  {}", category.id.as_i32(), category.name)?;
    }
    Ok(())
}

/// Lines, then the badge count and total.
pub fn cart(
    out: &mut impl Write,
    formatter: &CurrencyFormatter,
    lines: &[CartLine],
) -> Result<(), CliError> {
    if lines.is_empty() {
        writeln!(out, "Your cart is empty")?;
        return Ok(());
    }

    for line in lines {
        let name = line
            .name
            .clone()
            .unwrap_or_else(|| format!("Product {}", line.product_id));
        writeln!(
            out,
            "[{:>3}] {:<36} {:>4} x {:>12} = {:>14}",
            line.id.as_i32(),
            name,
            line.quantity,
            formatter.format(line.unit_price)?,
            formatter.format(line.line_total())?,
        )?;
    }

    let total = anufa_core::cart_total(lines);
    let count = anufa_core::cart_count(lines);
    let noun = if count == 1 { "item" } else { "items" };
    writeln!(out, "Total ({count} {noun}): {}", formatter.format(total)?)?;
    Ok(())
}

pub fn order(
    out: &mut impl Write,
    formatter: &CurrencyFormatter,
    order: &Order,
) -> Result<(), CliError> {
    writeln!(out, "Order {} placed", order.id)?;
    writeln!(out, "  Items:    {}", order.item_count())?;
    writeln!(out, "  Total:    {}", formatter.format_price(&order.total)?)?;
    writeln!(out, "  Payment:  {}", order.payment_method)?;
    writeln!(out, "  Ship to:  {}", order.shipping_address)?;
    writeln!(
        out,
        "  Placed:   {}",
        order.created_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    Ok(())
}

/// Shown when a cart change went through but the cart could not be re-read.
pub fn stale_note(out: &mut impl Write) -> Result<(), CliError> {
    writeln!(
        out,
        "Note: the cart could not be refreshed and may be out of date."
    )?;
    Ok(())
}

/// Shown when a paid order's items could not be taken out of the cart.
pub fn unsettled_note(out: &mut impl Write) -> Result<(), CliError> {
    writeln!(
        out,
        "Note: the ordered items are still in your cart. They will be removed before your next checkout."
    )?;
    Ok(())
}

pub fn checkout_state(
    out: &mut impl Write,
    formatter: &CurrencyFormatter,
    state: &CheckoutState,
) -> Result<(), CliError> {
    match state {
        CheckoutState::Complete {
            order: placed,
            cart_cleared,
        } => {
            order(out, formatter, placed)?;
            if !cart_cleared {
                unsettled_note(out)?;
            }
        }
        CheckoutState::Failed { message } => writeln!(out, "Checkout failed: {message}")?,
        other => writeln!(out, "Checkout: {}", other.status())?,
    }
    Ok(())
}
