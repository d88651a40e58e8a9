//! Commerce API client: catalog, cart and account endpoints.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use anufa_core::{CartLine, CartLineId, Category, Product, ProductId};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    AddToCartRequest, AuthResponse, CartItemPayload, CartResponse, CategoriesResponse,
    FeaturedResponse, LoginRequest, ProductResponse, ProductsResponse, RegisterRequest,
    SearchResponse,
};
use super::{ApiError, http_client, normalize_base, read_empty, read_json};
use crate::config::ApiConfig;
use crate::models::Session;

/// Client for the commerce API.
///
/// Product and category reads are cached for the configured TTL. Cart and
/// search calls always go to the server.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

impl std::fmt::Debug for CommerceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig, cache_ttl: Duration) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client: http_client(config.request_timeout)?,
                base_url: normalize_base(config.base_url.clone()),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    // =========================================================================
    // Catalog Methods (cached)
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let response = self.inner.client.get(self.url("products")?).send().await?;
        let products = read_json::<ProductsResponse>(response).await?.products;

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// List featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Featured).await
        {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let response = self
            .inner
            .client
            .get(self.url("products/featured")?)
            .send()
            .await?;
        let products = read_json::<FeaturedResponse>(response)
            .await?
            .featured_products;

        self.inner
            .cache
            .insert(CacheKey::Featured, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get one product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let response = self
            .inner
            .client
            .get(self.url(&format!("products/{id}"))?)
            .send()
            .await?;
        let product = read_json::<ProductResponse>(response).await?.product;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let response = self.inner.client.get(self.url("categories")?).send().await?;
        let categories = read_json::<CategoriesResponse>(response).await?.categories;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Full-text product search. The query is sent as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let mut url = self.url("search")?;
        url.query_pairs_mut().append_pair("q", query);

        let response = self.inner.client.get(url).send().await?;
        Ok(read_json::<SearchResponse>(response).await?.products)
    }

    /// Drop all cached catalog data.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Fetch the session's server-side cart.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token was rejected, or another
    /// error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn cart(&self, session: &Session) -> Result<Vec<CartLine>, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url("cart")?)
            .bearer_auth(session.token().expose_secret())
            .send()
            .await?;

        let lines = read_json::<CartResponse>(response)
            .await?
            .cart_items
            .into_iter()
            .filter_map(CartItemPayload::into_line)
            .collect();

        Ok(lines)
    }

    /// Add `quantity` of a product to the cart; a negative quantity reduces it.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        session: &Session,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("cart/add")?)
            .bearer_auth(session.token().expose_secret())
            .json(&AddToCartRequest {
                product_id,
                quantity,
            })
            .send()
            .await?;

        read_empty(response).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the server has no such line, or another
    /// error if the API request fails.
    #[instrument(skip(self, session), fields(line_id = %line_id))]
    pub async fn remove_from_cart(
        &self,
        session: &Session,
        line_id: CartLineId,
    ) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("cart/remove/{line_id}"))?)
            .bearer_auth(session.token().expose_secret())
            .send()
            .await?;

        read_empty(response).await
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    #[instrument(skip(self, password))]
    pub(crate) async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("auth/login")?)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        read_json(response).await
    }

    #[instrument(skip_all, fields(username = %request.username))]
    pub(crate) async fn register(
        &self,
        request: &RegisterRequest<'_>,
    ) -> Result<AuthResponse, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url("auth/register")?)
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }
}
