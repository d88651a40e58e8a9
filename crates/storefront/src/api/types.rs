//! Wire payloads for the commerce and recommendation APIs.
//!
//! Response envelopes are unwrapped by the clients; only the request types and
//! [`RecommendationResponse`] are part of the public surface.

use anufa_core::{CartLine, CartLineId, Category, CategoryId, Product, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::User;

/// Default number of recommendations requested by the home page.
pub const DEFAULT_RECOMMENDATION_LIMIT: u32 = 8;

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeaturedResponse {
    #[serde(default)]
    pub featured_products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesResponse {
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub products: Vec<Product>,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct CartResponse {
    #[serde(default)]
    pub cart_items: Vec<CartItemPayload>,
}

/// A cart row as the commerce API reports it.
#[derive(Debug, Deserialize)]
pub(crate) struct CartItemPayload {
    pub id: CartLineId,
    pub product_id: ProductId,
    #[serde(default)]
    pub name: Option<String>,
    pub price: Decimal,
    pub quantity: i64,
}

impl CartItemPayload {
    /// Convert to a [`CartLine`]. Rows whose quantity is not a positive
    /// `u32` are dropped with a warning.
    pub fn into_line(self) -> Option<CartLine> {
        let Some(quantity) = u32::try_from(self.quantity).ok().filter(|q| *q > 0) else {
            warn!(
                line_id = %self.id,
                product_id = %self.product_id,
                quantity = self.quantity,
                "Dropping cart row with unusable quantity"
            );
            return None;
        };
        Some(CartLine {
            id: self.id,
            product_id: self.product_id,
            name: self.name,
            unit_price: self.price,
            quantity,
        })
    }
}

/// `POST /cart/add` body; `quantity` is a delta and may be negative.
#[derive(Debug, Serialize)]
pub(crate) struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct AuthResponse {
    pub token: String,
    pub user: User,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error envelope. The commerce API sends `{"error": ...}`, the
/// recommendation API sends `{"detail": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .or_else(|| match self.detail? {
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .filter(|m| !m.trim().is_empty())
    }
}

// =============================================================================
// Recommendations
// =============================================================================

/// Request for personalised recommendations.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    pub limit: u32,
}

impl Default for RecommendationRequest {
    fn default() -> Self {
        Self {
            user_id: None,
            product_id: None,
            category_id: None,
            limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }
}

impl RecommendationRequest {
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Recommendations and the strategy that produced them.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub recommendations: Vec<Product>,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub confidence_score: f64,
    /// Server timestamp, passed through as sent.
    #[serde(default)]
    pub generated_at: Option<String>,
}
