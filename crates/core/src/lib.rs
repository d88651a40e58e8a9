//! Anufa Core - Shared types library.
//!
//! This crate provides common types used across all Anufa components:
//! - `storefront` - API clients, cart store, checkout flow and catalog view
//! - `cli` - Command-line front end for browsing, cart and checkout
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, catalog, cart and order types
//! - [`format`] - Locale-aware currency formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod format;
pub mod types;

pub use format::{CurrencyFormatter, FormatError, Locale};
pub use types::*;
