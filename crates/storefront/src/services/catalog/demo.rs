//! Built-in demo catalog, served only when live data is unavailable and the
//! fallback is enabled.

use rust_decimal::Decimal;

use anufa_core::{Category, CategoryId, Product, ProductId};

// (id, name, description, price in cents, featured, category)
const PRODUCTS: &[(i32, &str, &str, i64, bool, i32)] = &[
    (1, "Premium Headphones", "High-quality wireless headphones with noise cancellation", 19_999, true, 3),
    (2, "Smart Watch", "Advanced smartwatch with health monitoring", 29_999, false, 1),
    (3, "Laptop Pro", "High-performance laptop for professionals", 129_999, true, 2),
    (4, "Wireless Mouse", "Ergonomic wireless mouse for productivity", 4_999, false, 2),
    (5, "Keyboard Mechanical", "RGB mechanical keyboard for gaming", 12_999, false, 2),
    (6, "Monitor 4K", "27-inch 4K monitor with HDR support", 39_999, true, 1),
    (7, "Smartphone Pro", "Latest flagship smartphone with AI camera", 89_999, true, 4),
    (8, "Tablet Ultra", "Professional tablet with stylus support", 69_999, false, 4),
];

const CATEGORIES: &[(i32, &str)] = &[
    (1, "Electronics"),
    (2, "Computers"),
    (3, "Audio"),
    (4, "Mobile"),
];

const RECOMMENDED: &[i32] = &[4, 5, 6];

pub fn products() -> Vec<Product> {
    PRODUCTS
        .iter()
        .map(|&(id, name, description, cents, is_featured, category)| Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: Some(description.to_string()),
            price: Decimal::new(cents, 2),
            is_featured,
            category_id: Some(CategoryId::new(category)),
            category_name: category_name(category).map(str::to_string),
            sku: None,
            stock_quantity: None,
        })
        .collect()
}

pub fn featured() -> Vec<Product> {
    products().into_iter().filter(|p| p.is_featured).collect()
}

pub fn categories() -> Vec<Category> {
    CATEGORIES
        .iter()
        .map(|&(id, name)| Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: None,
        })
        .collect()
}

pub fn recommendations() -> Vec<Product> {
    products()
        .into_iter()
        .filter(|p| RECOMMENDED.contains(&p.id.as_i32()))
        .collect()
}

fn category_name(id: i32) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(category_id, _)| *category_id == id)
        .map(|(_, name)| *name)
}
