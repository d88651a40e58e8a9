//! Read-only catalog view.
//!
//! Listings carry a [`DataSource`] tag. When the fallback is enabled and the
//! commerce API cannot be reached, the built-in demo catalog is returned
//! tagged [`DataSource::Demo`]; otherwise the error is surfaced.

mod demo;

use tracing::{instrument, warn};

use anufa_core::{Category, CategoryId, DataSource, Product, ProductId};

use crate::api::{ApiError, CommerceClient, RecommendationClient, RecommendationRequest};
use crate::error::{StorefrontError, ValidationError};

/// Items together with where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub source: DataSource,
}

impl<T> Listing<T> {
    #[must_use]
    pub const fn live(items: Vec<T>) -> Self {
        Self {
            items,
            source: DataSource::Live,
        }
    }

    #[must_use]
    pub const fn demo(items: Vec<T>) -> Self {
        Self {
            items,
            source: DataSource::Demo,
        }
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.source.is_live()
    }
}

/// Catalog queries against the commerce and recommendation APIs.
#[derive(Clone)]
pub struct Catalog {
    commerce: CommerceClient,
    recommendations: RecommendationClient,
    demo_fallback: bool,
}

impl Catalog {
    #[must_use]
    pub const fn new(
        commerce: CommerceClient,
        recommendations: RecommendationClient,
        demo_fallback: bool,
    ) -> Self {
        Self {
            commerce,
            recommendations,
            demo_fallback,
        }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails and the demo fallback is off.
    pub async fn list_products(&self) -> Result<Listing<Product>, StorefrontError> {
        self.or_demo("products", self.commerce.products().await, demo::products)
    }

    /// Featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails and the demo fallback is off.
    pub async fn list_featured(&self) -> Result<Listing<Product>, StorefrontError> {
        self.or_demo(
            "featured products",
            self.commerce.featured_products().await,
            demo::featured,
        )
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails and the demo fallback is off.
    pub async fn list_categories(&self) -> Result<Listing<Category>, StorefrontError> {
        self.or_demo(
            "categories",
            self.commerce.categories().await,
            demo::categories,
        )
    }

    /// One product. There is no demo fallback for single products.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Api`] with [`ApiError::NotFound`] if the
    /// product does not exist.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, StorefrontError> {
        Ok(self.commerce.product(id).await?)
    }

    /// Search products by name and description.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySearchQuery`] for a blank query without
    /// making a request, or an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, StorefrontError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptySearchQuery.into());
        }
        Ok(self.commerce.search(query).await?)
    }

    /// Recommended products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails and the demo fallback is off.
    pub async fn recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Listing<Product>, StorefrontError> {
        let result = self
            .recommendations
            .recommend(request)
            .await
            .map(|response| response.recommendations);
        self.or_demo("recommendations", result, demo::recommendations)
    }

    fn or_demo<T>(
        &self,
        what: &str,
        result: Result<Vec<T>, ApiError>,
        demo: fn() -> Vec<T>,
    ) -> Result<Listing<T>, StorefrontError> {
        match result {
            Ok(items) => Ok(Listing::live(items)),
            Err(e) if self.demo_fallback => {
                warn!(error = %e, "Could not load {what}, showing demo data");
                Ok(Listing::demo(demo()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Products in `category`, or all products when `category` is `None`.
#[must_use]
pub fn filter_by_category(products: &[Product], category: Option<CategoryId>) -> Vec<&Product> {
    products
        .iter()
        .filter(|product| category.is_none_or(|id| product.in_category(id)))
        .collect()
}
