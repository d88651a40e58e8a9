//! Shared storefront context.

use std::sync::Arc;

use anufa_core::CurrencyFormatter;

use crate::api::{ApiError, CommerceClient, RecommendationClient};
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::models::Session;
use crate::services::auth::{Authenticator, TokenStore};
use crate::services::cart::{CartStore, SessionCart, SharedCart};
use crate::services::catalog::Catalog;
use crate::services::checkout::{CheckoutFlow, PaymentGateway, SimulatedGateway};

/// Everything a front end needs, built once from configuration.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    catalog: Catalog,
    auth: Authenticator,
}

impl Storefront {
    /// Create the API clients and services.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let commerce = CommerceClient::new(&config.api, config.catalog.cache_ttl)?;
        let recommendations = RecommendationClient::new(&config.api)?;
        let catalog = Catalog::new(
            commerce.clone(),
            recommendations,
            config.catalog.demo_fallback,
        );
        let auth = Authenticator::new(commerce.clone(), TokenStore::new(&config.token_file));

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                commerce,
                catalog,
                auth,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn formatter(&self) -> &CurrencyFormatter {
        &self.inner.config.formatter
    }

    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn auth(&self) -> &Authenticator {
        &self.inner.auth
    }

    /// Open the cart for a session: remote when logged in, local otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cart cannot be fetched.
    pub async fn open_cart(&self, session: Option<&Session>) -> Result<SessionCart, StorefrontError> {
        SessionCart::for_session(&self.inner.commerce, session).await
    }

    /// Checkout for `cart` using the configured simulated gateway.
    #[must_use]
    pub fn checkout<C: CartStore + 'static>(&self, cart: SharedCart<C>) -> CheckoutFlow<C, SimulatedGateway> {
        self.checkout_with(cart, self.gateway())
    }

    /// Checkout for `cart` using a specific gateway.
    #[must_use]
    pub fn checkout_with<C, G>(&self, cart: SharedCart<C>, gateway: G) -> CheckoutFlow<C, G>
    where
        C: CartStore + 'static,
        G: PaymentGateway + 'static,
    {
        CheckoutFlow::new(cart, gateway, self.inner.config.formatter.currency())
            .with_timeout(self.inner.config.checkout.payment_timeout)
    }

    /// The simulated gateway with the configured delay.
    #[must_use]
    pub fn gateway(&self) -> SimulatedGateway {
        SimulatedGateway::approving(self.inner.config.checkout.payment_delay)
    }
}
