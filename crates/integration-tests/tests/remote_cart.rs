//! Integration tests for the server-backed cart.
//!
//! Run with: cargo test -p anufa-integration-tests --test remote_cart

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;
use secrecy::SecretString;

use anufa_core::{CartLineId, ProductId};
use anufa_integration_tests::{MockBackend, SHOPPER, SHOPPER_PASSWORD};
use anufa_storefront::services::cart::{CartStore, SessionCart};
use anufa_storefront::{Storefront, StorefrontError, ValidationError};

async fn logged_in_cart(backend: &MockBackend, name: &str) -> (Storefront, SessionCart) {
    let store = backend.storefront(name, false);
    let session = store
        .auth()
        .login(SHOPPER, &SecretString::from(SHOPPER_PASSWORD))
        .await
        .unwrap();
    let cart = store.open_cart(Some(&session)).await.unwrap();
    (store, cart)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_anonymous_cart_is_local() {
    let backend = MockBackend::start().await;
    let store = backend.storefront("anonymous", false);

    let mut cart = store.open_cart(None).await.unwrap();
    assert!(!cart.is_remote());

    let headphones = store.catalog().get_product(ProductId::new(1)).await.unwrap();
    cart.add_product(&headphones, 2).await.unwrap();
    assert_eq!(cart.total(), dec("399.98"));
    assert_eq!(backend.hits("cart_add"), 0);
}

#[tokio::test]
async fn test_quantity_lifecycle_on_server() {
    let backend = MockBackend::start().await;
    let (store, mut cart) = logged_in_cart(&backend, "lifecycle").await;
    assert!(cart.is_remote());
    assert!(cart.is_empty());

    let headphones = store.catalog().get_product(ProductId::new(1)).await.unwrap();
    cart.add_product(&headphones, 2).await.unwrap();
    assert_eq!(cart.count(), 2);
    assert_eq!(cart.total(), dec("399.98"));
    assert_eq!(cart.lines()[0].name.as_deref(), Some("Wireless Headphones"));
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 2)]);

    cart.set_quantity(ProductId::new(1), 3).await.unwrap();
    assert_eq!(cart.total(), dec("599.97"));
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 3)]);

    cart.set_quantity(ProductId::new(1), 1).await.unwrap();
    assert_eq!(cart.count(), 1);
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 1)]);

    let line_id = cart.lines()[0].id;
    cart.remove_item(line_id).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total(), Decimal::ZERO);
    assert!(backend.cart_of(SHOPPER).is_empty());
}

#[tokio::test]
async fn test_adding_same_product_accumulates() {
    let backend = MockBackend::start().await;
    let (_store, mut cart) = logged_in_cart(&backend, "accumulate").await;

    cart.add_item(ProductId::new(2), dec("1299.99"), 1)
        .await
        .unwrap();
    cart.add_item(ProductId::new(2), dec("1299.99"), 2)
        .await
        .unwrap();

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.count(), 3);
    assert_eq!(backend.cart_of(SHOPPER), vec![(2, 3)]);
}

#[tokio::test]
async fn test_invalid_quantities_are_not_sent() {
    let backend = MockBackend::start().await;
    let (_store, mut cart) = logged_in_cart(&backend, "invalid-qty").await;

    cart.add_item(ProductId::new(3), dec("89.99"), 1)
        .await
        .unwrap();
    let sent = backend.hits("cart_add");

    let err = cart.add_item(ProductId::new(3), dec("89.99"), 0).await.unwrap_err();
    assert!(matches!(
        err,
        StorefrontError::Validation(ValidationError::InvalidQuantity(0))
    ));

    let err = cart.set_quantity(ProductId::new(3), 0).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));

    let err = cart.set_quantity(ProductId::new(2), 4).await.unwrap_err();
    assert!(matches!(err, StorefrontError::NotFound(_)));

    assert_eq!(backend.hits("cart_add"), sent);
    assert_eq!(cart.count(), 1);
}

#[tokio::test]
async fn test_failed_write_keeps_snapshot() {
    let backend = MockBackend::start().await;
    let (_store, mut cart) = logged_in_cart(&backend, "failed-write").await;

    cart.add_item(ProductId::new(1), dec("199.99"), 1)
        .await
        .unwrap();
    let before = cart.lines().to_vec();

    backend.set_cart_writes_down(true);
    let err = cart
        .add_item(ProductId::new(2), dec("1299.99"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StorefrontError::Api(_)));
    assert_eq!(cart.lines(), before.as_slice());

    let err = cart.clear().await.unwrap_err();
    assert!(matches!(err, StorefrontError::Api(_)));
    assert_eq!(cart.lines(), before.as_slice());

    backend.set_cart_writes_down(false);
    cart.clear().await.unwrap();
    assert!(cart.is_empty());
    assert!(backend.cart_of(SHOPPER).is_empty());
}

#[tokio::test]
async fn test_removing_missing_line_succeeds() {
    let backend = MockBackend::start().await;
    let (_store, mut cart) = logged_in_cart(&backend, "missing-line").await;

    cart.remove_item(CartLineId::new(9999)).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(backend.hits("cart_remove"), 1);
}

#[tokio::test]
async fn test_unknown_product_is_rejected_by_server() {
    let backend = MockBackend::start().await;
    let (_store, mut cart) = logged_in_cart(&backend, "unknown-product").await;

    let err = cart
        .add_item(ProductId::new(404), dec("1.00"), 1)
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Product not found");
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_clear_empties_server_cart() {
    let backend = MockBackend::start().await;
    let (_store, mut cart) = logged_in_cart(&backend, "clear").await;

    cart.add_item(ProductId::new(1), dec("199.99"), 1)
        .await
        .unwrap();
    cart.add_item(ProductId::new(3), dec("89.99"), 2)
        .await
        .unwrap();
    assert_eq!(cart.count(), 3);

    cart.clear().await.unwrap();
    assert_eq!(cart.count(), 0);
    assert_eq!(cart.total(), Decimal::ZERO);
    assert!(backend.cart_of(SHOPPER).is_empty());
    assert_eq!(backend.hits("cart_remove"), 2);
}

#[tokio::test]
async fn test_applied_write_survives_failed_reread() {
    let backend = MockBackend::start().await;
    let (_store, mut cart) = logged_in_cart(&backend, "failed-reread").await;

    backend.set_cart_reads_down(true);
    cart.add_item(ProductId::new(1), dec("199.99"), 1)
        .await
        .unwrap();
    assert!(cart.is_stale());
    assert!(cart.is_empty());
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 1)]);

    // While the snapshot cannot be re-read, nothing more is sent.
    let sent = backend.hits("cart_add");
    let err = cart
        .add_item(ProductId::new(1), dec("199.99"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StorefrontError::Api(_)));
    assert_eq!(backend.hits("cart_add"), sent);
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 1)]);

    backend.set_cart_reads_down(false);
    cart.add_item(ProductId::new(1), dec("199.99"), 1)
        .await
        .unwrap();
    assert!(!cart.is_stale());
    assert_eq!(cart.count(), 2);
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 2)]);
}
