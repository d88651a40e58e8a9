//! Storefront services.
//!
//! # Services
//!
//! - `auth` - Login, registration and the persisted session token
//! - `cart` - Cart store, local or backed by the commerce API
//! - `catalog` - Read-only catalog view with optional demo fallback
//! - `checkout` - Checkout state machine and payment gateway

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
