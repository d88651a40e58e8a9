//! Status and choice enums shared between the storefront and its front ends.

use serde::{Deserialize, Serialize};

/// Phase of a checkout attempt.
///
/// `Idle → Validating → Processing → Complete`, or
/// `Processing → Failed → Idle`. Both terminal phases return to `Idle` when
/// the shopper dismisses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    #[default]
    Idle,
    Validating,
    Processing,
    Complete,
    Failed,
}

impl CheckoutStatus {
    /// Whether an attempt is currently running.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Validating | Self::Processing)
    }

    /// Whether the attempt has finished and is waiting to be dismissed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::Processing => write!(f, "processing"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Payment method offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card.
    #[default]
    Card,
    /// `PayPal` account.
    PayPal,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::PayPal => write!(f, "paypal"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" | "credit_card" | "credit-card" => Ok(Self::Card),
            "paypal" | "pay_pal" => Ok(Self::PayPal),
            _ => Err(format!("Invalid payment method: {s} (expected card or paypal)")),
        }
    }
}

/// Where a piece of catalog data came from.
///
/// Demo data is only ever served when live data could not be fetched and
/// the fallback was explicitly enabled, and it is always tagged so it cannot
/// be mistaken for the real catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Demo,
}

impl DataSource {
    /// Whether the data came from the live services.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}
