//! Unified error handling.
//!
//! Every fallible storefront operation returns [`StorefrontError`]. Front ends
//! show [`StorefrontError::user_message`] to the shopper and use
//! [`StorefrontError::is_auth`] to decide when the stored session must be
//! discarded.

use anufa_core::EmailError;
use thiserror::Error;

use crate::api::ApiError;
use crate::services::checkout::CheckoutError;

/// Input rejected before anything is sent over the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Search query cannot be empty")]
    EmptySearchQuery,

    #[error("Quantity must be at least 1 (got {0})")]
    InvalidQuantity(i64),

    #[error("Quantity cannot exceed {max}")]
    QuantityTooLarge { max: u32 },

    #[error("Shipping address is required")]
    EmptyShippingAddress,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Input validation failed; nothing was sent.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Remote service call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout was rejected or the payment failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Reading or writing the persisted session token failed.
    #[error("Session storage error: {0}")]
    Session(#[from] std::io::Error),

    /// Username or password rejected at login.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Resource not found locally.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl StorefrontError {
    /// Whether the commerce API rejected the session's credentials.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Api(ApiError::Unauthorized(_)))
    }

    /// Message suitable for showing to the shopper.
    ///
    /// Transport and parsing details are replaced with generic wording; the
    /// full error is logged by the caller.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Api(err) => match err {
                ApiError::Http(e) if e.is_timeout() => {
                    "The store took too long to respond. Please try again.".to_string()
                }
                ApiError::Http(_) => "Could not reach the store. Please try again.".to_string(),
                ApiError::Api { message, .. } => message.clone(),
                ApiError::Unauthorized(_) => {
                    "Your session has expired. Please log in again.".to_string()
                }
                ApiError::NotFound(message) => message.clone(),
                ApiError::Parse(_) | ApiError::InvalidUrl(_) => {
                    "The store sent an unexpected response".to_string()
                }
            },
            Self::Checkout(err) => err.to_string(),
            Self::Session(_) => "Could not access the saved session".to_string(),
            Self::InvalidCredentials => self.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
