//! Locale-aware currency formatting.
//!
//! A small, pure replacement for a browser's `Intl.NumberFormat` with
//! `style: "currency"`: symbol prefix, locale digit grouping and a fixed
//! number of fraction digits with half-away-from-zero rounding.
//!
//! ```
//! use anufa_core::CurrencyFormatter;
//! use rust_decimal::Decimal;
//!
//! let usd = CurrencyFormatter::usd();
//! assert_eq!(usd.format(Decimal::new(129_999, 2)).unwrap(), "$1,299.99");
//!
//! let inr = CurrencyFormatter::inr();
//! assert_eq!(inr.format(Decimal::new(129_999, 0)).unwrap(), "₹1,29,999");
//! ```

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::types::price::{CurrencyCode, Price};

/// Largest supported number of fraction digits.
pub const MAX_FRACTION_DIGITS: u32 = 10;

/// Errors produced when an amount cannot be displayed as money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Amounts shown to shoppers are never negative.
    #[error("cannot format a negative amount")]
    Negative,
    /// NaN or infinity.
    #[error("cannot format a non-finite amount")]
    NonFinite,
    /// The value does not fit in a decimal.
    #[error("amount is out of range")]
    OutOfRange,
}

/// Digit grouping convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// Groups of three: `1,234,567.89`.
    #[default]
    EnUs,
    /// Indian grouping, last three then pairs: `12,34,567.89`.
    EnIn,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnUs => f.write_str("en-US"),
            Self::EnIn => f.write_str("en-IN"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(Self::EnUs),
            "en-in" => Ok(Self::EnIn),
            _ => Err(format!("unsupported locale: {s}")),
        }
    }
}

/// Formats amounts for display in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormatter {
    currency: CurrencyCode,
    locale: Locale,
    fraction_digits: u32,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::usd()
    }
}

impl CurrencyFormatter {
    /// Create a formatter. `fraction_digits` is capped at
    /// [`MAX_FRACTION_DIGITS`].
    #[must_use]
    pub fn new(currency: CurrencyCode, locale: Locale, fraction_digits: u32) -> Self {
        Self {
            currency,
            locale,
            fraction_digits: fraction_digits.min(MAX_FRACTION_DIGITS),
        }
    }

    /// US dollars, `en-US`, two fraction digits.
    #[must_use]
    pub const fn usd() -> Self {
        Self {
            currency: CurrencyCode::USD,
            locale: Locale::EnUs,
            fraction_digits: 2,
        }
    }

    /// Indian rupees, `en-IN`, whole rupees only.
    #[must_use]
    pub const fn inr() -> Self {
        Self {
            currency: CurrencyCode::INR,
            locale: Locale::EnIn,
            fraction_digits: 0,
        }
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    #[must_use]
    pub const fn fraction_digits(&self) -> u32 {
        self.fraction_digits
    }

    /// Format an amount in this formatter's currency.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Negative`] for amounts below zero.
    pub fn format(&self, amount: Decimal) -> Result<String, FormatError> {
        self.render(amount, self.currency)
    }

    /// Format a binary floating point amount.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::NonFinite`] for NaN or infinity,
    /// [`FormatError::Negative`] for amounts below zero, and
    /// [`FormatError::OutOfRange`] for magnitudes a decimal cannot hold.
    pub fn format_f64(&self, amount: f64) -> Result<String, FormatError> {
        if !amount.is_finite() {
            return Err(FormatError::NonFinite);
        }
        if amount < 0.0 {
            return Err(FormatError::Negative);
        }
        let amount = Decimal::try_from(amount).map_err(|_| FormatError::OutOfRange)?;
        self.format(amount)
    }

    /// Format a [`Price`] using its own currency symbol with this formatter's
    /// locale and precision.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Negative`] for amounts below zero.
    pub fn format_price(&self, price: &Price) -> Result<String, FormatError> {
        self.render(price.amount, price.currency_code)
    }

    fn render(&self, amount: Decimal, currency: CurrencyCode) -> Result<String, FormatError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(FormatError::Negative);
        }

        let mut rounded = amount
            .abs()
            .round_dp_with_strategy(self.fraction_digits, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(self.fraction_digits);

        let digits = rounded.to_string();
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

        let mut out = String::with_capacity(digits.len() + 8);
        out.push_str(currency.symbol());
        out.push_str(&group_digits(integer, self.locale));
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(fraction);
        }
        Ok(out)
    }
}

/// Insert thousands separators into a string of ASCII digits.
fn group_digits(integer: &str, locale: Locale) -> String {
    let len = integer.len();
    let mut out = String::with_capacity(len + len / 2);

    for (i, ch) in integer.chars().enumerate() {
        let remaining = len - i;
        let boundary = match locale {
            Locale::EnUs => remaining % 3 == 0,
            // Last group of three, then groups of two.
            Locale::EnIn => remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0),
        };
        if i > 0 && boundary {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
