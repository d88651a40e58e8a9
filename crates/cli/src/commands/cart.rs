//! Server cart commands. These need a logged-in session.

use std::io;

use anufa_core::{CartLineId, ProductId};
use anufa_storefront::Storefront;
use anufa_storefront::services::cart::{CartStore, RemoteCart};

use crate::commands::catalog::find_product;
use crate::error::CliError;
use crate::output;

async fn open(store: &Storefront) -> Result<RemoteCart, CliError> {
    let session = store.auth().restore().await?.ok_or(CliError::NotLoggedIn)?;
    Ok(RemoteCart::load(store.commerce().clone(), session).await?)
}

fn show_lines(store: &Storefront, cart: &RemoteCart) -> Result<(), CliError> {
    output::cart(&mut io::stdout(), store.formatter(), cart.lines())?;
    if cart.is_stale() {
        output::stale_note(&mut io::stdout())?;
    }
    Ok(())
}

pub async fn show(store: &Storefront) -> Result<(), CliError> {
    let cart = open(store).await?;
    show_lines(store, &cart)
}

pub async fn add(store: &Storefront, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    let mut cart = open(store).await?;
    let product = find_product(store, product_id).await?;
    cart.add_product(&product, quantity).await?;
    show_lines(store, &cart)
}

pub async fn remove(store: &Storefront, line_id: CartLineId) -> Result<(), CliError> {
    let mut cart = open(store).await?;
    cart.remove_item(line_id).await?;
    show_lines(store, &cart)
}

pub async fn set(store: &Storefront, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    let mut cart = open(store).await?;
    cart.set_quantity(product_id, quantity).await?;
    show_lines(store, &cart)
}

pub async fn clear(store: &Storefront) -> Result<(), CliError> {
    let mut cart = open(store).await?;
    cart.clear().await?;
    show_lines(store, &cart)
}
