//! Integration tests for checkout over a server cart.
//!
//! Run with: cargo test -p anufa-integration-tests --test checkout

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;

use anufa_core::{CheckoutStatus, PaymentMethod, ProductId};
use anufa_integration_tests::{MockBackend, SHOPPER, SHOPPER_PASSWORD};
use anufa_storefront::services::cart::{CartStore, SessionCart, SharedCart, shared};
use anufa_storefront::services::checkout::{
    CheckoutError, CheckoutState, PaymentError, SimulatedGateway,
};
use anufa_storefront::{Storefront, ValidationError};

async fn filled_cart(backend: &MockBackend, name: &str) -> (Storefront, SharedCart<SessionCart>) {
    let store = backend.storefront(name, false);
    let session = store
        .auth()
        .login(SHOPPER, &SecretString::from(SHOPPER_PASSWORD))
        .await
        .unwrap();
    let mut cart = store.open_cart(Some(&session)).await.unwrap();

    let headphones = store.catalog().get_product(ProductId::new(1)).await.unwrap();
    cart.add_product(&headphones, 2).await.unwrap();
    (store, shared(cart))
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_server_cart() {
    let backend = MockBackend::start().await;
    let (store, cart) = filled_cart(&backend, "checkout-ok").await;
    let checkout = store.checkout(cart.clone());

    let order = checkout
        .submit(PaymentMethod::Card, "1 Main St, Springfield")
        .await
        .unwrap();

    assert_eq!(order.total.amount.to_string(), "399.98");
    assert_eq!(order.item_count(), 2);
    assert_eq!(order.shipping_address, "1 Main St, Springfield");
    assert_eq!(checkout.status(), CheckoutStatus::Complete);
    assert_eq!(checkout.state().order(), Some(&order));

    assert_eq!(cart.lock().await.count(), 0);
    assert!(backend.cart_of(SHOPPER).is_empty());

    checkout.dismiss().unwrap();
    assert_eq!(checkout.status(), CheckoutStatus::Idle);
}

#[tokio::test]
async fn test_declined_payment_keeps_server_cart() {
    let backend = MockBackend::start().await;
    let (store, cart) = filled_cart(&backend, "checkout-declined").await;
    let gateway = SimulatedGateway::declining(Duration::from_millis(10), "Card declined");
    let checkout = store.checkout_with(cart.clone(), gateway);

    let err = checkout
        .submit(PaymentMethod::Card, "1 Main St")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CheckoutError::Payment(PaymentError::Declined("Card declined".to_string()))
    );
    assert_eq!(checkout.status(), CheckoutStatus::Failed);

    assert_eq!(cart.lock().await.count(), 2);
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 2)]);
    assert_eq!(backend.hits("cart_remove"), 0);
}

#[tokio::test]
async fn test_blank_address_never_reaches_payment() {
    let backend = MockBackend::start().await;
    let (store, cart) = filled_cart(&backend, "checkout-address").await;
    let checkout = store.checkout(cart);
    let mut updates = checkout.subscribe();

    let err = checkout
        .submit(PaymentMethod::PayPal, "   ")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CheckoutError::Validation(ValidationError::EmptyShippingAddress)
    );
    assert_eq!(checkout.status(), CheckoutStatus::Idle);

    // The last published state is Idle again, never Processing.
    assert_eq!(updates.borrow_and_update().status(), CheckoutStatus::Idle);
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 2)]);
}

#[tokio::test]
async fn test_concurrent_submit_is_rejected() {
    let backend = MockBackend::start().await;
    let (store, cart) = filled_cart(&backend, "checkout-concurrent").await;
    let gateway = SimulatedGateway::approving(Duration::from_millis(200));
    let checkout = store.checkout_with(cart, gateway);

    let first = checkout.submit(PaymentMethod::Card, "1 Main St");
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        checkout.submit(PaymentMethod::Card, "1 Main St").await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), CheckoutError::InFlight);
    assert_eq!(checkout.status(), CheckoutStatus::Complete);
    assert!(backend.cart_of(SHOPPER).is_empty());
}

#[tokio::test]
async fn test_paid_lines_left_in_cart_block_the_next_checkout() {
    let backend = MockBackend::start().await;
    let (store, cart) = filled_cart(&backend, "checkout-unsettled").await;
    let gateway = SimulatedGateway::approving(Duration::from_millis(200));
    let checkout = store.checkout_with(cart.clone(), gateway);
    let mut states = checkout.subscribe();

    let submit = checkout.submit(PaymentMethod::Card, "1 Main St");
    let outage = async {
        states
            .wait_for(|state| state.status() == CheckoutStatus::Processing)
            .await
            .unwrap();
        backend.set_cart_writes_down(true);
    };
    let (order, ()) = tokio::join!(submit, outage);
    let order = order.unwrap();

    assert_eq!(
        checkout.state(),
        CheckoutState::Complete {
            order,
            cart_cleared: false
        }
    );
    assert_eq!(cart.lock().await.count(), 2);
    assert_eq!(backend.cart_of(SHOPPER), vec![(1, 2)]);

    // The paid lines must go before anything else is charged.
    checkout.dismiss().unwrap();
    let err = checkout
        .submit(PaymentMethod::Card, "1 Main St")
        .await
        .unwrap_err();
    assert_eq!(err, CheckoutError::Unsettled);
    assert_eq!(checkout.status(), CheckoutStatus::Idle);

    backend.set_cart_writes_down(false);
    let err = checkout
        .submit(PaymentMethod::Card, "1 Main St")
        .await
        .unwrap_err();
    assert_eq!(err, CheckoutError::Validation(ValidationError::EmptyCart));
    assert!(backend.cart_of(SHOPPER).is_empty());
    assert_eq!(cart.lock().await.count(), 0);
}

#[tokio::test]
async fn test_products_added_during_payment_are_not_removed() {
    let backend = MockBackend::start().await;
    let (store, cart) = filled_cart(&backend, "checkout-added-late").await;
    let gateway = SimulatedGateway::approving(Duration::from_millis(200));
    let checkout = store.checkout_with(cart.clone(), gateway);
    let mut states = checkout.subscribe();
    let laptop = store.catalog().get_product(ProductId::new(2)).await.unwrap();

    let submit = checkout.submit(PaymentMethod::Card, "1 Main St");
    let shopping = async {
        states
            .wait_for(|state| state.status() == CheckoutStatus::Processing)
            .await
            .unwrap();
        cart.lock().await.add_product(&laptop, 4).await.unwrap();
    };
    let (order, ()) = tokio::join!(submit, shopping);

    let order = order.unwrap();
    assert_eq!(order.item_count(), 2);
    assert_eq!(backend.cart_of(SHOPPER), vec![(2, 4)]);
    assert_eq!(cart.lock().await.count(), 4);
}
