//! Payment gateway seam.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument};

use anufa_core::{OrderId, PaymentMethod, Price};

/// A charge to be made for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Price,
    pub method: PaymentMethod,
}

/// Proof that a charge went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub reference: String,
}

/// Errors reported by a payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment service unavailable: {0}")]
    Unavailable(String),
}

/// Something that can charge a payment method.
pub trait PaymentGateway: Send + Sync {
    fn charge(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<PaymentReceipt, PaymentError>> + Send;
}

/// Stand-in gateway: waits for a fixed delay, then approves (or declines,
/// when configured to).
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
    decline_reason: Option<String>,
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::approving(Duration::from_secs(3))
    }
}

impl SimulatedGateway {
    #[must_use]
    pub const fn approving(delay: Duration) -> Self {
        Self {
            delay,
            decline_reason: None,
        }
    }

    #[must_use]
    pub fn declining(delay: Duration, reason: impl Into<String>) -> Self {
        Self {
            delay,
            decline_reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl PaymentGateway for SimulatedGateway {
    #[instrument(skip_all, fields(order_id = %request.order_id, method = %request.method))]
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        tokio::time::sleep(self.delay).await;

        if let Some(reason) = &self.decline_reason {
            debug!(reason = %reason, "Simulated payment declined");
            return Err(PaymentError::Declined(reason.clone()));
        }

        Ok(PaymentReceipt {
            reference: format!("SIM-{}", request.order_id),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use anufa_core::CurrencyCode;
    use rust_decimal::Decimal;

    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            order_id: OrderId::generate(),
            amount: Price::new(Decimal::new(39_998, 2), CurrencyCode::USD),
            method: PaymentMethod::Card,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_gateway_waits_then_approves() {
        let gateway = SimulatedGateway::default();
        let request = request();

        let started = tokio::time::Instant::now();
        let receipt = gateway.charge(&request).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(receipt.reference, format!("SIM-{}", request.order_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_gateway_can_decline() {
        let gateway = SimulatedGateway::declining(Duration::from_millis(10), "Insufficient funds");
        let err = gateway.charge(&request()).await.unwrap_err();
        assert_eq!(err, PaymentError::Declined("Insufficient funds".to_string()));
    }
}
