//! CLI error type.

use anufa_core::FormatError;
use anufa_storefront::api::ApiError;
use anufa_storefront::services::checkout::CheckoutError;
use anufa_storefront::{StorefrontError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not format price: {0}")]
    Format(#[from] FormatError),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("{0}")]
    Usage(String),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Storefront(err.into())
    }
}

impl From<CheckoutError> for CliError {
    fn from(err: CheckoutError) -> Self {
        Self::Storefront(err.into())
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Storefront(err.into())
    }
}

impl CliError {
    /// The stored session was rejected by the server.
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Storefront(err) if err.is_auth())
    }

    /// Whether the failure points at the backend rather than the shopper's
    /// input, and should be reported to Sentry.
    pub const fn is_server_fault(&self) -> bool {
        match self {
            Self::Storefront(StorefrontError::Api(ApiError::Api { status, .. })) => *status >= 500,
            Self::Storefront(StorefrontError::Api(ApiError::Parse(_))) => true,
            _ => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Storefront(err) => err.user_message(),
            Self::NotLoggedIn => "You are not logged in. Run `anufa login` first.".to_string(),
            other => other.to_string(),
        }
    }
}
