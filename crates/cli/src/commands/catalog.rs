//! Catalog browsing commands.

use std::io::{self, Write};

use anufa_core::{CategoryId, Product, ProductId};
use anufa_storefront::api::RecommendationRequest;
use anufa_storefront::services::catalog::filter_by_category;
use anufa_storefront::{Session, Storefront, StorefrontError};

use crate::error::CliError;
use crate::output;

/// Options for a recommendation request.
#[derive(Debug, Clone, Copy)]
pub struct RecommendOptions {
    pub limit: u32,
    pub product: Option<ProductId>,
    pub category: Option<CategoryId>,
}

pub async fn products(store: &Storefront, category: Option<CategoryId>) -> Result<(), CliError> {
    let listing = store.catalog().list_products().await?;
    let mut out = io::stdout();
    output::source_note(&mut out, listing.source)?;
    output::products(
        &mut out,
        store.formatter(),
        filter_by_category(&listing.items, category),
    )
}

pub async fn featured(store: &Storefront) -> Result<(), CliError> {
    let listing = store.catalog().list_featured().await?;
    let mut out = io::stdout();
    output::source_note(&mut out, listing.source)?;
    output::products(&mut out, store.formatter(), &listing.items)
}

pub async fn categories(store: &Storefront) -> Result<(), CliError> {
    let listing = store.catalog().list_categories().await?;
    let mut out = io::stdout();
    output::source_note(&mut out, listing.source)?;
    output::categories(&mut out, &listing.items)
}

pub async fn product(store: &Storefront, id: ProductId) -> Result<(), CliError> {
    let product = store.catalog().get_product(id).await?;
    output::product_detail(&mut io::stdout(), store.formatter(), &product)
}

pub async fn search(store: &Storefront, query: &str) -> Result<(), CliError> {
    let results = store.catalog().search(query).await?;
    let mut out = io::stdout();
    writeln!(out, "{} result(s) for \"{}\"", results.len(), query.trim())?;
    output::products(&mut out, store.formatter(), &results)
}

pub async fn recommend(
    store: &Storefront,
    session: Option<&Session>,
    options: RecommendOptions,
) -> Result<(), CliError> {
    let request = RecommendationRequest {
        user_id: session.and_then(Session::user_id),
        product_id: options.product,
        category_id: options.category,
        limit: options.limit,
    };
    let listing = store.catalog().recommendations(&request).await?;
    let mut out = io::stdout();
    output::source_note(&mut out, listing.source)?;
    output::products(&mut out, store.formatter(), &listing.items)
}

/// Find a product to put in the cart.
///
/// Looks in the product listing so that demo products can be added when the
/// store is offline and the fallback is on.
pub async fn find_product(store: &Storefront, id: ProductId) -> Result<Product, CliError> {
    let listing = store.catalog().list_products().await?;
    listing
        .items
        .into_iter()
        .find(|product| product.id == id)
        .ok_or_else(|| StorefrontError::NotFound(format!("product {id}")).into())
}
