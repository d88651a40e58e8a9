//! Anufa Storefront library.
//!
//! Client-side storefront logic backed by two remote services: the commerce
//! API (catalog, cart, auth) and the recommendation API.
//!
//! # Architecture
//!
//! - [`api`] - Typed HTTP clients (`reqwest`), catalog responses cached with `moka`
//! - [`models`] - Session and user types
//! - [`services`] - Catalog view, cart store, checkout flow, authentication
//! - [`state`] - [`Storefront`], the shared context wiring it all together
//!
//! Nothing in this crate keeps ambient global state: the authenticated
//! [`Session`] is an explicit value handed to every component that talks to
//! the commerce API on the shopper's behalf.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

pub use config::StorefrontConfig;
pub use error::{StorefrontError, ValidationError};
pub use models::{Session, User};
pub use state::Storefront;
