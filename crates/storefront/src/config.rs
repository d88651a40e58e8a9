//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ANUFA_API_BASE_URL` - Commerce API base URL (default: `http://localhost:8080`)
//! - `ANUFA_AI_API_BASE_URL` - Recommendation API base URL (default: `http://localhost:8001`)
//! - `ANUFA_REQUEST_TIMEOUT_SECS` - Per-request HTTP timeout (default: 10)
//! - `ANUFA_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `ANUFA_DEMO_FALLBACK` - Serve built-in demo data when the catalog is unreachable (default: false)
//! - `ANUFA_CURRENCY` - Display currency (default: USD)
//! - `ANUFA_LOCALE` - Digit grouping locale, `en-US` or `en-IN` (default: en-US)
//! - `ANUFA_FRACTION_DIGITS` - Displayed fraction digits (default: the currency's minor units)
//! - `ANUFA_PAYMENT_DELAY_MS` - Simulated payment processing time (default: 3000)
//! - `ANUFA_PAYMENT_TIMEOUT_SECS` - Abort payment after this long (default: none)
//! - `ANUFA_TOKEN_FILE` - Where the session token is persisted (default: `$HOME/.anufa/token`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anufa_core::{CurrencyCode, CurrencyFormatter, Locale};
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_AI_API_BASE_URL: &str = "http://localhost:8001";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_PAYMENT_DELAY_MS: u64 = 3000;
const DEFAULT_TOKEN_FILE: &str = ".anufa/token";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote service endpoints
    pub api: ApiConfig,
    /// Catalog caching and fallback behaviour
    pub catalog: CatalogConfig,
    /// How amounts are shown to the shopper
    pub formatter: CurrencyFormatter,
    /// Payment simulation settings
    pub checkout: CheckoutConfig,
    /// File holding the persisted bearer token
    pub token_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Remote API endpoints.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Commerce API (catalog, cart, auth)
    pub base_url: Url,
    /// Recommendation API
    pub ai_base_url: Url,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub cache_ttl: Duration,
    /// Off unless explicitly enabled; demo data is always tagged.
    pub demo_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub payment_delay: Duration,
    pub payment_timeout: Option<Duration>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            demo_fallback: false,
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            payment_delay: Duration::from_millis(DEFAULT_PAYMENT_DELAY_MS),
            payment_timeout: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let api = ApiConfig {
            base_url: env.url("ANUFA_API_BASE_URL", DEFAULT_API_BASE_URL)?,
            ai_base_url: env.url("ANUFA_AI_API_BASE_URL", DEFAULT_AI_API_BASE_URL)?,
            request_timeout: Duration::from_secs(
                env.parse_or("ANUFA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            ),
        };

        let catalog = CatalogConfig {
            cache_ttl: Duration::from_secs(
                env.parse_or("ANUFA_CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
            ),
            demo_fallback: env.flag("ANUFA_DEMO_FALLBACK")?,
        };

        let currency: CurrencyCode = env.parse_or("ANUFA_CURRENCY", CurrencyCode::USD)?;
        let locale: Locale = env.parse_or("ANUFA_LOCALE", Locale::EnUs)?;
        let fraction_digits: u32 = env.parse_or("ANUFA_FRACTION_DIGITS", currency.minor_units())?;

        let checkout = CheckoutConfig {
            payment_delay: Duration::from_millis(
                env.parse_or("ANUFA_PAYMENT_DELAY_MS", DEFAULT_PAYMENT_DELAY_MS)?,
            ),
            payment_timeout: env
                .parse_optional::<u64>("ANUFA_PAYMENT_TIMEOUT_SECS")?
                .map(Duration::from_secs),
        };

        let token_file = env.get_optional("ANUFA_TOKEN_FILE").map_or_else(
            || default_token_file(env.get_optional("HOME")),
            PathBuf::from,
        );

        Ok(Self {
            api,
            catalog,
            formatter: CurrencyFormatter::new(currency, locale, fraction_digits),
            checkout,
            token_file,
            sentry_dsn: env.get_optional("SENTRY_DSN"),
            sentry_environment: env.get_optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn default_token_file(home: Option<String>) -> PathBuf {
    home.map_or_else(
        || PathBuf::from(DEFAULT_TOKEN_FILE),
        |home| PathBuf::from(home).join(DEFAULT_TOKEN_FILE),
    )
}

/// Typed access to a variable source.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Get a variable with a default value.
    fn get_env_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn parse_optional<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_optional(key)
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse_optional(key)?.unwrap_or(default))
    }

    fn url(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        let raw = self.get_env_or_default(key, default);
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }

    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        match self.get_optional(key).map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("0" | "false" | "no" | "off") => Ok(false),
            Some("1" | "true" | "yes" | "on") => Ok(true),
            Some(other) => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}
