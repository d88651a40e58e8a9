//! Cart store.
//!
//! [`CartStore`] is the single interface the front end uses for the cart. Two
//! implementations exist: [`LocalCart`] for anonymous shoppers and
//! [`RemoteCart`] for logged-in shoppers, whose cart lives on the commerce
//! API. [`SessionCart`] picks one of them once, when the session starts.
//!
//! Reads (`lines`, `total`, `count`) are answered from the local snapshot and
//! never touch the network.

mod local;
mod remote;

pub use local::LocalCart;
pub use remote::RemoteCart;

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use anufa_core::{CartLine, CartLineId, Product, ProductId, cart_count, cart_total};

use crate::api::CommerceClient;
use crate::error::{StorefrontError, ValidationError};
use crate::models::Session;

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: u32 = 9999;

/// A cart shared between tasks.
///
/// The tokio mutex is fair, so concurrent mutations are applied in the order
/// they were submitted.
pub type SharedCart<C> = Arc<Mutex<C>>;

/// Wrap a cart for sharing.
pub fn shared<C>(cart: C) -> SharedCart<C> {
    Arc::new(Mutex::new(cart))
}

/// Operations on a shopper's cart.
pub trait CartStore: Send + Sync {
    /// Add `quantity` units of a product. An existing line for the product is
    /// increased; otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidQuantity`] when `quantity` is zero.
    fn add_item(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
    ) -> impl Future<Output = Result<(), StorefrontError>> + Send;

    /// Add a catalog product, keeping its name for display.
    ///
    /// # Errors
    ///
    /// Same as [`CartStore::add_item`].
    fn add_product(
        &mut self,
        product: &Product,
        quantity: u32,
    ) -> impl Future<Output = Result<(), StorefrontError>> + Send {
        self.add_item(product.id, product.price, quantity)
    }

    /// Remove a line. Removing a line that is not there succeeds.
    fn remove_item(
        &mut self,
        line_id: CartLineId,
    ) -> impl Future<Output = Result<(), StorefrontError>> + Send;

    /// Replace the quantity of the line holding `product_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidQuantity`] for zero (use
    /// [`CartStore::remove_item`] to delete a line) and
    /// [`StorefrontError::NotFound`] if the product is not in the cart.
    fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), StorefrontError>> + Send;

    /// Remove every line.
    fn clear(&mut self) -> impl Future<Output = Result<(), StorefrontError>> + Send;

    /// Current lines in insertion order.
    fn lines(&self) -> &[CartLine];

    /// Sum of line totals.
    fn total(&self) -> Decimal {
        cart_total(self.lines())
    }

    /// Sum of quantities.
    fn count(&self) -> u64 {
        cart_count(self.lines())
    }

    fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    /// Whether the lines may be behind the server, after a change that was
    /// applied but could not be re-read.
    fn is_stale(&self) -> bool {
        false
    }

    fn line_for(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines().iter().find(|line| line.product_id == product_id)
    }
}

/// Reject quantities outside `1..=MAX_LINE_QUANTITY`.
pub(crate) fn validate_quantity(quantity: u32) -> Result<u32, ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::InvalidQuantity(i64::from(quantity)));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::QuantityTooLarge {
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(quantity)
}

fn not_in_cart(product_id: ProductId) -> StorefrontError {
    StorefrontError::NotFound(format!("product {product_id} is not in the cart"))
}

// =============================================================================
// SessionCart
// =============================================================================

/// The cart for the current session: local when anonymous, remote when
/// logged in.
#[derive(Debug)]
pub enum SessionCart {
    Local(LocalCart),
    Remote(RemoteCart),
}

impl SessionCart {
    /// Choose the cart for a session, loading the server cart when logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cart cannot be fetched.
    pub async fn for_session(
        client: &CommerceClient,
        session: Option<&Session>,
    ) -> Result<Self, StorefrontError> {
        match session {
            Some(session) => Ok(Self::Remote(
                RemoteCart::load(client.clone(), session.clone()).await?,
            )),
            None => Ok(Self::Local(LocalCart::new())),
        }
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl CartStore for SessionCart {
    async fn add_item(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<(), StorefrontError> {
        match self {
            Self::Local(cart) => cart.add_item(product_id, unit_price, quantity).await,
            Self::Remote(cart) => cart.add_item(product_id, unit_price, quantity).await,
        }
    }

    async fn add_product(&mut self, product: &Product, quantity: u32) -> Result<(), StorefrontError> {
        match self {
            Self::Local(cart) => cart.add_product(product, quantity).await,
            Self::Remote(cart) => cart.add_product(product, quantity).await,
        }
    }

    async fn remove_item(&mut self, line_id: CartLineId) -> Result<(), StorefrontError> {
        match self {
            Self::Local(cart) => cart.remove_item(line_id).await,
            Self::Remote(cart) => cart.remove_item(line_id).await,
        }
    }

    async fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), StorefrontError> {
        match self {
            Self::Local(cart) => cart.set_quantity(product_id, quantity).await,
            Self::Remote(cart) => cart.set_quantity(product_id, quantity).await,
        }
    }

    async fn clear(&mut self) -> Result<(), StorefrontError> {
        match self {
            Self::Local(cart) => cart.clear().await,
            Self::Remote(cart) => cart.clear().await,
        }
    }

    fn lines(&self) -> &[CartLine] {
        match self {
            Self::Local(cart) => cart.lines(),
            Self::Remote(cart) => cart.lines(),
        }
    }

    fn is_stale(&self) -> bool {
        match self {
            Self::Local(cart) => cart.is_stale(),
            Self::Remote(cart) => cart.is_stale(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(1).unwrap(), 1);
        assert_eq!(validate_quantity(MAX_LINE_QUANTITY).unwrap(), MAX_LINE_QUANTITY);
        assert_eq!(
            validate_quantity(0).unwrap_err(),
            ValidationError::InvalidQuantity(0)
        );
        assert!(matches!(
            validate_quantity(MAX_LINE_QUANTITY + 1).unwrap_err(),
            ValidationError::QuantityTooLarge { .. }
        ));
    }

    #[tokio::test]
    async fn test_anonymous_session_gets_local_cart() {
        let config = crate::config::ApiConfig {
            base_url: url::Url::parse("http://127.0.0.1:9").unwrap(),
            ai_base_url: url::Url::parse("http://127.0.0.1:9").unwrap(),
            request_timeout: std::time::Duration::from_secs(1),
        };
        let client = CommerceClient::new(&config, std::time::Duration::from_secs(1)).unwrap();

        let mut cart = SessionCart::for_session(&client, None).await.unwrap();
        assert!(!cart.is_remote());

        cart.add_item(ProductId::new(1), "199.99".parse().unwrap(), 2)
            .await
            .unwrap();
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.total(), "399.98".parse().unwrap());
    }

    #[tokio::test]
    async fn test_shared_cart_applies_mutations_in_order() {
        let cart = shared(LocalCart::new());
        let held = cart.lock().await;

        // Each task queues on the lock before the next one is spawned.
        let mut handles = Vec::new();
        for i in 1..=5 {
            let cart = Arc::clone(&cart);
            let (queued, ready) = tokio::sync::oneshot::channel();
            handles.push(tokio::spawn(async move {
                let _ = queued.send(());
                let mut guard = cart.lock().await;
                guard.add_item(ProductId::new(i), Decimal::ONE, 1).await
            }));
            ready.await.unwrap();
        }
        drop(held);

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let cart = cart.lock().await;
        let order: Vec<ProductId> = cart.lines().iter().map(|line| line.product_id).collect();
        assert_eq!(order, (1..=5).map(ProductId::new).collect::<Vec<_>>());
    }
}
