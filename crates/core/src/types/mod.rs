//! Core types for Anufa.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod catalog;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use cart::{CartLine, cart_count, cart_total};
pub use catalog::{Category, Product};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::Order;
pub use price::{CurrencyCode, Price, UnknownCurrency};
pub use status::*;
