//! Catalog types owned by the commerce backend.
//!
//! These are read-only from the client's point of view: they are fetched,
//! filtered and displayed, never mutated.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{CategoryId, ProductId};

/// A product as listed by the catalog service.
///
/// The backend sends `price` either as a JSON number or as a decimal string;
/// both deserialize losslessly into [`Decimal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in the store currency.
    pub price: Decimal,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
}

impl Product {
    /// Description text, empty when the backend has none.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Whether this product belongs to `category_id`.
    #[must_use]
    pub fn in_category(&self, category_id: CategoryId) -> bool {
        self.category_id == Some(category_id)
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
