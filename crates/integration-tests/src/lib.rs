//! Integration tests for Anufa.
//!
//! The tests drive the real `anufa-storefront` HTTP clients against
//! [`MockBackend`], an in-process axum server that speaks the commerce API
//! and the recommendation API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p anufa-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Listings, caching, search, demo fallback, recommendations
//! - `auth` - Login, registration, token persistence
//! - `remote_cart` - Server cart mutations and snapshot refresh
//! - `checkout` - Checkout flow over a server cart

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use anufa_core::{Category, CategoryId, Product, ProductId};
use anufa_storefront::{Storefront, StorefrontConfig};

/// Password of the account every backend starts with.
pub const SHOPPER_PASSWORD: &str = "correct-horse";

/// Username of the account every backend starts with.
pub const SHOPPER: &str = "shopper";

// =============================================================================
// Backend state
// =============================================================================

#[derive(Debug, Clone)]
struct Account {
    id: i32,
    password: String,
}

#[derive(Debug, Clone)]
struct Line {
    id: i32,
    product_id: ProductId,
    quantity: i64,
}

#[derive(Debug, Default)]
struct Backend {
    products: Vec<Product>,
    categories: Vec<Category>,
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, i32>,
    carts: HashMap<i32, Vec<Line>>,
    next_id: i32,
    hits: HashMap<&'static str, usize>,
    catalog_down: bool,
    cart_reads_down: bool,
    cart_writes_down: bool,
}

impl Backend {
    fn seeded() -> Self {
        let mut backend = Self {
            products: vec![
                product(1, "Wireless Headphones", "199.99", true, 1),
                product(2, "Laptop Pro", "1299.99", true, 2),
                product(3, "Coffee Maker", "89.99", false, 3),
            ],
            categories: vec![category(1, "Audio"), category(2, "Computers"), category(3, "Kitchen")],
            next_id: 100,
            ..Self::default()
        };
        backend.create_account(SHOPPER, SHOPPER_PASSWORD);
        backend
    }

    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn create_account(&mut self, username: &str, password: &str) -> i32 {
        let id = self.next_id();
        self.accounts.insert(
            username.to_string(),
            Account {
                id,
                password: password.to_string(),
            },
        );
        id
    }

    fn issue_token(&mut self, user_id: i32) -> String {
        let token = format!("token-{}", self.next_id());
        self.tokens.insert(token.clone(), user_id);
        token
    }

    fn hit(&mut self, endpoint: &'static str) {
        *self.hits.entry(endpoint).or_default() += 1;
    }

    fn cart_json(&self, user_id: i32) -> Value {
        let items: Vec<Value> = self
            .carts
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|line| {
                let product = self.products.iter().find(|p| p.id == line.product_id)?;
                Some(json!({
                    "id": line.id,
                    "product_id": line.product_id,
                    "name": product.name,
                    "price": product.price,
                    "quantity": line.quantity,
                    "item_total": product.price * Decimal::from(line.quantity),
                }))
            })
            .collect();
        json!({ "cart_items": items })
    }
}

fn product(id: i32, name: &str, price: &str, featured: bool, category_id: i32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: Some(format!("{name} for everyday use")),
        price: price.parse().unwrap_or_default(),
        is_featured: featured,
        category_id: Some(CategoryId::new(category_id)),
        category_name: None,
        sku: None,
        stock_quantity: Some(10),
    }
}

fn category(id: i32, name: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: name.to_string(),
        description: None,
    }
}

type Shared = Arc<Mutex<Backend>>;

fn lock(state: &Shared) -> MutexGuard<'_, Backend> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn bearer_user(backend: &Backend, headers: &HeaderMap) -> Option<i32> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    backend.tokens.get(token).copied()
}

// =============================================================================
// Catalog handlers
// =============================================================================

async fn products(State(state): State<Shared>) -> Response {
    let mut backend = lock(&state);
    backend.hit("products");
    if backend.catalog_down {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Catalog is down for maintenance");
    }
    Json(json!({ "products": backend.products })).into_response()
}

async fn featured(State(state): State<Shared>) -> Response {
    let mut backend = lock(&state);
    backend.hit("featured");
    if backend.catalog_down {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Catalog is down for maintenance");
    }
    let featured: Vec<&Product> = backend.products.iter().filter(|p| p.is_featured).collect();
    Json(json!({ "featured_products": featured })).into_response()
}

async fn product_by_id(State(state): State<Shared>, Path(id): Path<i32>) -> Response {
    let mut backend = lock(&state);
    backend.hit("product");
    match backend.products.iter().find(|p| p.id.as_i32() == id) {
        Some(product) => Json(json!({ "product": product })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn categories(State(state): State<Shared>) -> Response {
    let mut backend = lock(&state);
    backend.hit("categories");
    if backend.catalog_down {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Catalog is down for maintenance");
    }
    Json(json!({ "categories": backend.categories })).into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
}

async fn search(State(state): State<Shared>, Query(params): Query<SearchParams>) -> Response {
    let mut backend = lock(&state);
    backend.hit("search");
    let needle = params.q.to_lowercase();
    let found: Vec<&Product> = backend
        .products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description().to_lowercase().contains(&needle)
        })
        .collect();
    Json(json!({ "products": found, "query": params.q })).into_response()
}

// =============================================================================
// Cart handlers
// =============================================================================

async fn cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = lock(&state);
    backend.hit("cart");
    let Some(user_id) = bearer_user(&backend, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };
    if backend.cart_reads_down {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Cart service unavailable");
    }
    Json(backend.cart_json(user_id)).into_response()
}

#[derive(Deserialize)]
struct AddToCart {
    product_id: ProductId,
    quantity: i64,
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<AddToCart>,
) -> Response {
    let mut backend = lock(&state);
    backend.hit("cart_add");
    let Some(user_id) = bearer_user(&backend, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };
    if backend.cart_writes_down {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Cart service unavailable");
    }
    if !backend.products.iter().any(|p| p.id == body.product_id) {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }

    let new_id = backend.next_id();
    let lines = backend.carts.entry(user_id).or_default();
    match lines.iter_mut().find(|line| line.product_id == body.product_id) {
        Some(line) => {
            line.quantity += body.quantity;
            if line.quantity <= 0 {
                let id = line.id;
                lines.retain(|line| line.id != id);
            }
        }
        None if body.quantity > 0 => lines.push(Line {
            id: new_id,
            product_id: body.product_id,
            quantity: body.quantity,
        }),
        None => return error(StatusCode::BAD_REQUEST, "Quantity must be positive"),
    }

    Json(json!({ "message": "Item added to cart" })).into_response()
}

async fn remove_from_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(line_id): Path<i32>,
) -> Response {
    let mut backend = lock(&state);
    backend.hit("cart_remove");
    let Some(user_id) = bearer_user(&backend, &headers) else {
        return error(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };
    if backend.cart_writes_down {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Cart service unavailable");
    }

    let lines = backend.carts.entry(user_id).or_default();
    let before = lines.len();
    lines.retain(|line| line.id != line_id);
    if lines.len() == before {
        return error(StatusCode::NOT_FOUND, "Cart item not found");
    }
    Json(json!({ "message": "Item removed from cart" })).into_response()
}

// =============================================================================
// Auth handlers
// =============================================================================

#[derive(Deserialize)]
struct Login {
    username: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<Login>) -> Response {
    let mut backend = lock(&state);
    backend.hit("login");
    let account = backend
        .accounts
        .get(&body.username)
        .filter(|account| account.password == body.password)
        .cloned();
    let Some(account) = account else {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    let token = backend.issue_token(account.id);
    Json(json!({
        "token": token,
        "user": { "id": account.id, "username": body.username },
    }))
    .into_response()
}

#[derive(Deserialize)]
struct Register {
    username: String,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

async fn register(State(state): State<Shared>, Json(body): Json<Register>) -> Response {
    let mut backend = lock(&state);
    backend.hit("register");
    if [&body.email, &body.first_name, &body.last_name]
        .iter()
        .any(|field| field.is_empty())
    {
        return error(StatusCode::BAD_REQUEST, "All fields are required");
    }
    if backend.accounts.contains_key(&body.username) {
        return error(StatusCode::CONFLICT, "Username already exists");
    }

    let user_id = backend.create_account(&body.username, &body.password);
    let token = backend.issue_token(user_id);
    (
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "user": {
                "id": user_id,
                "username": body.username,
                "email": body.email,
                "first_name": body.first_name,
                "last_name": body.last_name,
            },
        })),
    )
        .into_response()
}

// =============================================================================
// Recommendation handler
// =============================================================================

#[derive(Deserialize)]
struct Recommend {
    #[serde(default)]
    user_id: Option<i32>,
    #[serde(default)]
    category_id: Option<CategoryId>,
    limit: usize,
}

async fn recommendations(State(state): State<Shared>, Json(body): Json<Recommend>) -> Response {
    let mut backend = lock(&state);
    backend.hit("recommendations");
    let picks: Vec<&Product> = backend
        .products
        .iter()
        .filter(|p| body.category_id.is_none_or(|id| p.in_category(id)))
        .take(body.limit)
        .collect();
    Json(json!({
        "user_id": body.user_id,
        "recommendations": picks,
        "strategy": "popular",
        "confidence_score": 0.75,
        "generated_at": "2024-01-01T00:00:00Z",
    }))
    .into_response()
}

// =============================================================================
// Server
// =============================================================================

/// An in-process commerce and recommendation backend on a random port.
///
/// The server task is aborted when the value is dropped.
pub struct MockBackend {
    url: Url,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend seeded with three products, three categories and the
    /// [`SHOPPER`] account.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend::seeded()));

        let app = Router::new()
            .route("/products", get(products))
            .route("/products/featured", get(featured))
            .route("/products/{id}", get(product_by_id))
            .route("/categories", get(categories))
            .route("/search", get(search))
            .route("/cart", get(cart))
            .route("/cart/add", post(add_to_cart))
            .route("/cart/remove/{id}", delete(remove_from_cart))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/recommendations", post(recommendations))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let url = Url::parse(&format!("http://{addr}/")).expect("mock backend url");
        Self { url, state, server }
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Storefront configuration pointing both APIs at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is rejected.
    #[must_use]
    pub fn config(&self, token_file: &std::path::Path, demo_fallback: bool) -> StorefrontConfig {
        let base = self.url.as_str().to_string();
        let token_file = token_file.display().to_string();
        let demo = demo_fallback.to_string();
        StorefrontConfig::from_lookup(|key| match key {
            "ANUFA_API_BASE_URL" | "ANUFA_AI_API_BASE_URL" => Some(base.clone()),
            "ANUFA_TOKEN_FILE" => Some(token_file.clone()),
            "ANUFA_DEMO_FALLBACK" => Some(demo.clone()),
            "ANUFA_REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
            "ANUFA_PAYMENT_DELAY_MS" => Some("10".to_string()),
            _ => None,
        })
        .expect("valid test configuration")
    }

    /// A [`Storefront`] wired to this backend with its own token file.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP clients cannot be built.
    #[must_use]
    pub fn storefront(&self, name: &str, demo_fallback: bool) -> Storefront {
        let token_file = temp_token_file(name);
        Storefront::new(self.config(&token_file, demo_fallback)).expect("storefront")
    }

    /// How many requests an endpoint has served, e.g. `"products"` or `"cart_add"`.
    #[must_use]
    pub fn hits(&self, endpoint: &str) -> usize {
        lock(&self.state).hits.get(endpoint).copied().unwrap_or(0)
    }

    /// Make the catalog listing endpoints answer 503.
    pub fn set_catalog_down(&self, down: bool) {
        lock(&self.state).catalog_down = down;
    }

    /// Make `GET /cart` answer 503.
    pub fn set_cart_reads_down(&self, down: bool) {
        lock(&self.state).cart_reads_down = down;
    }

    /// Make cart add and remove answer 500.
    pub fn set_cart_writes_down(&self, down: bool) {
        lock(&self.state).cart_writes_down = down;
    }

    /// Revoke every issued token, as if all sessions expired.
    pub fn expire_sessions(&self) {
        lock(&self.state).tokens.clear();
    }

    /// `(product_id, quantity)` pairs in a user's server cart.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<(i32, i64)> {
        let backend = lock(&self.state);
        let Some(account) = backend.accounts.get(username) else {
            return Vec::new();
        };
        backend
            .carts
            .get(&account.id)
            .into_iter()
            .flatten()
            .map(|line| (line.product_id.as_i32(), line.quantity))
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A fresh token file path for one test, with any earlier file removed.
#[must_use]
pub fn temp_token_file(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("anufa-it-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("token")
}
