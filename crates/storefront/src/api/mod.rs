//! HTTP clients for the commerce API and the recommendation API.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; the backends are the source of truth
//! - Catalog reads cached in memory via `moka` (configurable TTL)
//! - Cart and search are never cached
//! - Authenticated calls take an explicit [`Session`](crate::Session) and send
//!   `Authorization: Bearer <token>`

mod cache;
mod commerce;
mod recommendations;
pub mod types;

pub use commerce::CommerceClient;
pub use recommendations::RecommendationClient;
pub use types::{RecommendationRequest, RecommendationResponse};

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use types::ErrorBody;

/// Longest response excerpt written to the logs.
const LOG_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to the remote services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Credentials missing, invalid or expired (401/403).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Build the shared HTTP client.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("anufa/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Normalize a base URL so relative endpoint paths join beneath it.
///
/// `Url::join` replaces the last path segment unless the base ends in `/`.
pub(crate) fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    check_status(status, &body)?;

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %excerpt(&body),
            "Failed to parse API response"
        );
        ApiError::Parse(e.to_string())
    })
}

/// Check the status and discard the body.
pub(crate) async fn read_empty(response: reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();
    let body = response.text().await?;
    check_status(status, &body)
}

fn check_status(status: reqwest::StatusCode, body: &str) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }

    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    match status.as_u16() {
        401 | 403 => {
            tracing::debug!(status = %status, "API rejected credentials");
            Err(ApiError::Unauthorized(message))
        }
        404 => Err(ApiError::NotFound(message)),
        code => {
            tracing::error!(
                status = %status,
                body = %excerpt(body),
                "API returned non-success status"
            );
            Err(ApiError::Api {
                status: code,
                message,
            })
        }
    }
}

/// Pull the human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.into_message()
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_normalize_base() {
        let base = normalize_base(Url::parse("http://localhost:8080").unwrap());
        assert_eq!(base.join("products").unwrap().as_str(), "http://localhost:8080/products");

        let base = normalize_base(Url::parse("https://shop.example.com/api").unwrap());
        assert_eq!(
            base.join("cart/add").unwrap().as_str(),
            "https://shop.example.com/api/cart/add"
        );

        let base = normalize_base(Url::parse("https://shop.example.com/api/").unwrap());
        assert_eq!(base.path(), "/api/");
    }

    #[test]
    fn test_check_status_maps_error_bodies() {
        assert!(check_status(StatusCode::OK, "").is_ok());

        let err = check_status(StatusCode::UNAUTHORIZED, r#"{"error": "Invalid credentials"}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid credentials"));

        let err = check_status(StatusCode::NOT_FOUND, r#"{"error": "Product not found"}"#)
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));

        let err = check_status(
            StatusCode::CONFLICT,
            r#"{"error": "Username or email already exists"}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Api { status: 409, ref message } if message == "Username or email already exists"
        ));
    }

    #[test]
    fn test_check_status_falls_back_to_reason() {
        let err = check_status(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").unwrap_err();
        assert!(matches!(
            err,
            ApiError::Api { status: 500, ref message } if message == "Internal Server Error"
        ));
    }

    #[test]
    fn test_excerpt_truncates() {
        assert_eq!(excerpt(&"x".repeat(2000)).len(), LOG_BODY_LIMIT);
    }
}
