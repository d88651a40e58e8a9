//! Checkout flow.
//!
//! One checkout attempt at a time moves through
//! `Idle → Validating → Processing → Complete | Failed`. The current state is
//! published on a `tokio::sync::watch` channel so a front end can redraw as
//! the attempt progresses.
//!
//! Each attempt runs on its own task. Dropping the future returned by
//! [`CheckoutFlow::submit`] does not stop the attempt; it still reaches
//! `Complete` or `Failed` and publishes that state.
//!
//! A submit while another attempt is in flight is rejected outright rather
//! than queued; a finished attempt must be dismissed before the next one.
//!
//! After payment only the ordered quantities are taken out of the cart, so
//! items added while the payment was processing stay in it. If that step
//! fails, the paid lines are remembered and removed before the next attempt
//! may start.

mod gateway;

pub use gateway::{PaymentError, PaymentGateway, PaymentReceipt, PaymentRequest, SimulatedGateway};

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{Instrument, error, info, instrument, warn};

use anufa_core::{CartLine, CheckoutStatus, CurrencyCode, Order, PaymentMethod};

use crate::error::{StorefrontError, ValidationError};
use crate::services::cart::{CartStore, SharedCart};

/// Errors returned by [`CheckoutFlow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("A checkout is already in progress")]
    InFlight,

    #[error("Dismiss the previous order before starting a new checkout")]
    NotDismissed,

    #[error(
        "Your last order was paid but its items are still in the cart. Try again once the cart can be updated"
    )]
    Unsettled,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Payment timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Checkout was interrupted")]
    Interrupted,
}

/// Checkout state with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Validating,
    Processing,
    /// Payment went through. `cart_cleared` is false when the ordered lines
    /// could not be taken out of the cart.
    Complete {
        order: Order,
        cart_cleared: bool,
    },
    Failed {
        message: String,
    },
}

impl CheckoutState {
    #[must_use]
    pub const fn status(&self) -> CheckoutStatus {
        match self {
            Self::Idle => CheckoutStatus::Idle,
            Self::Validating => CheckoutStatus::Validating,
            Self::Processing => CheckoutStatus::Processing,
            Self::Complete { .. } => CheckoutStatus::Complete,
            Self::Failed { .. } => CheckoutStatus::Failed,
        }
    }

    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        match self {
            Self::Complete { order, .. } => Some(order),
            _ => None,
        }
    }
}

/// Drives checkout for one cart.
///
/// Clones share the same state, so a clone can be moved into a task.
pub struct CheckoutFlow<C, G> {
    inner: Arc<FlowInner<C, G>>,
    currency: CurrencyCode,
    timeout: Option<Duration>,
}

impl<C, G> Clone for CheckoutFlow<C, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            currency: self.currency,
            timeout: self.timeout,
        }
    }
}

struct FlowInner<C, G> {
    cart: SharedCart<C>,
    gateway: G,
    state: watch::Sender<CheckoutState>,
    /// Lines of a paid order that are still in the cart.
    unsettled: Mutex<Vec<CartLine>>,
}

struct Attempt {
    payment_method: PaymentMethod,
    shipping_address: String,
    currency: CurrencyCode,
    timeout: Option<Duration>,
}

impl<C, G> CheckoutFlow<C, G>
where
    C: CartStore + 'static,
    G: PaymentGateway + 'static,
{
    #[must_use]
    pub fn new(cart: SharedCart<C>, gateway: G, currency: CurrencyCode) -> Self {
        let (state, _) = watch::channel(CheckoutState::Idle);
        Self {
            inner: Arc::new(FlowInner {
                cart,
                gateway,
                state,
                unsettled: Mutex::new(Vec::new()),
            }),
            currency,
            timeout: None,
        }
    }

    /// Fail the payment step if the gateway takes longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn cart(&self) -> &SharedCart<C> {
        &self.inner.cart
    }

    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn status(&self) -> CheckoutStatus {
        self.inner.state.borrow().status()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.inner.state.subscribe()
    }

    /// Place an order for the current cart contents.
    ///
    /// On success the ordered quantities are removed from the cart and the
    /// state becomes [`CheckoutState::Complete`]. On payment failure the cart
    /// is left as it was and the state becomes [`CheckoutState::Failed`].
    ///
    /// The attempt runs on a spawned task and finishes even if the returned
    /// future is dropped.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InFlight`] if another attempt is running
    /// - [`CheckoutError::NotDismissed`] if the last order was not dismissed
    /// - [`CheckoutError::Unsettled`] if a paid order's lines are still in
    ///   the cart and still cannot be removed
    /// - [`CheckoutError::Validation`] for a blank address or an empty cart
    /// - [`CheckoutError::Payment`] or [`CheckoutError::Timeout`] if payment fails
    /// - [`CheckoutError::Interrupted`] if the attempt's task died
    #[instrument(skip(self, shipping_address), fields(method = %payment_method))]
    pub async fn submit(
        &self,
        payment_method: PaymentMethod,
        shipping_address: &str,
    ) -> Result<Order, CheckoutError> {
        self.begin()?;

        let attempt = Attempt {
            payment_method,
            shipping_address: shipping_address.to_string(),
            currency: self.currency,
            timeout: self.timeout,
        };
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run(attempt).await }.in_current_span());

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Checkout task ended before finishing");
                self.inner.state.send_replace(CheckoutState::Failed {
                    message: CheckoutError::Interrupted.to_string(),
                });
                Err(CheckoutError::Interrupted)
            }
        }
    }

    /// Return to `Idle` after a completed or failed attempt.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InFlight`] while an attempt is running.
    pub fn dismiss(&self) -> Result<(), CheckoutError> {
        let mut outcome = Ok(());
        self.inner.state.send_if_modified(|state| match state.status() {
            CheckoutStatus::Idle => false,
            CheckoutStatus::Validating | CheckoutStatus::Processing => {
                outcome = Err(CheckoutError::InFlight);
                false
            }
            CheckoutStatus::Complete | CheckoutStatus::Failed => {
                *state = CheckoutState::Idle;
                true
            }
        });
        outcome
    }

    /// Atomically move from `Idle`/`Failed` to `Validating`.
    fn begin(&self) -> Result<(), CheckoutError> {
        let mut outcome = Ok(());
        self.inner.state.send_if_modified(|state| match state.status() {
            CheckoutStatus::Idle | CheckoutStatus::Failed => {
                *state = CheckoutState::Validating;
                true
            }
            CheckoutStatus::Validating | CheckoutStatus::Processing => {
                outcome = Err(CheckoutError::InFlight);
                false
            }
            CheckoutStatus::Complete => {
                outcome = Err(CheckoutError::NotDismissed);
                false
            }
        });
        outcome
    }
}

impl<C, G> FlowInner<C, G>
where
    C: CartStore,
    G: PaymentGateway,
{
    async fn run(&self, attempt: Attempt) -> Result<Order, CheckoutError> {
        let order = match self.prepare(&attempt).await {
            Ok(order) => order,
            Err(e) => {
                self.state.send_replace(CheckoutState::Idle);
                return Err(e);
            }
        };

        self.state.send_replace(CheckoutState::Processing);
        info!(
            order_id = %order.id,
            total = %order.total.amount,
            items = order.item_count(),
            "Processing payment"
        );

        let request = PaymentRequest {
            order_id: order.id,
            amount: order.total,
            method: attempt.payment_method,
        };

        match self.charge(&request, attempt.timeout).await {
            Ok(receipt) => {
                let cart_cleared = self.settle(&order).await;
                info!(
                    order_id = %order.id,
                    reference = %receipt.reference,
                    cart_cleared,
                    "Order complete"
                );
                self.state.send_replace(CheckoutState::Complete {
                    order: order.clone(),
                    cart_cleared,
                });
                Ok(order)
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Payment failed");
                self.state.send_replace(CheckoutState::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Settle any earlier paid lines, then validate and snapshot the cart.
    async fn prepare(&self, attempt: &Attempt) -> Result<Order, CheckoutError> {
        let mut unsettled = self.unsettled.lock().await;
        if !unsettled.is_empty() {
            let mut cart = self.cart.lock().await;
            if let Err((e, remaining)) = remove_ordered(&mut *cart, &unsettled).await {
                warn!(error = %e, lines = remaining.len(), "Paid lines are still in the cart");
                *unsettled = remaining;
                return Err(CheckoutError::Unsettled);
            }
            unsettled.clear();
        }
        drop(unsettled);

        let address = attempt.shipping_address.trim();
        if address.is_empty() {
            return Err(ValidationError::EmptyShippingAddress.into());
        }

        let lines = self.cart.lock().await.lines().to_vec();
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        Ok(Order::new(
            lines,
            attempt.payment_method,
            address,
            attempt.currency,
        ))
    }

    async fn charge(
        &self,
        request: &PaymentRequest,
        timeout: Option<Duration>,
    ) -> Result<PaymentReceipt, CheckoutError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.gateway.charge(request))
                .await
                .map_err(|_| CheckoutError::Timeout(limit))?
                .map_err(CheckoutError::from),
            None => Ok(self.gateway.charge(request).await?),
        }
    }

    /// Take the ordered lines out of the cart. Returns whether that worked;
    /// on failure the lines left over are kept for the next attempt.
    async fn settle(&self, order: &Order) -> bool {
        let result = {
            let mut cart = self.cart.lock().await;
            remove_ordered(&mut *cart, &order.lines).await
        };

        match result {
            Ok(()) => true,
            Err((e, remaining)) => {
                warn!(
                    order_id = %order.id,
                    error = %e,
                    lines = remaining.len(),
                    "Payment succeeded but the ordered items could not be removed from the cart"
                );
                *self.unsettled.lock().await = remaining;
                false
            }
        }
    }
}

/// Remove `ordered` from `cart`, matching lines by id. A line whose quantity
/// grew since the order was taken is reduced by the ordered amount instead.
///
/// Stops at the first failure and returns it with the lines not yet removed.
async fn remove_ordered<C: CartStore>(
    cart: &mut C,
    ordered: &[CartLine],
) -> Result<(), (StorefrontError, Vec<CartLine>)> {
    for (done, line) in ordered.iter().enumerate() {
        let current = cart
            .lines()
            .iter()
            .find(|current| current.id == line.id)
            .map(|current| (current.product_id, current.quantity));

        let result = match current {
            None => Ok(()),
            Some((_, quantity)) if quantity <= line.quantity => cart.remove_item(line.id).await,
            Some((product_id, quantity)) => {
                cart.set_quantity(product_id, quantity - line.quantity).await
            }
        };

        if let Err(e) = result {
            return Err((e, ordered.iter().skip(done).cloned().collect()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use anufa_core::ProductId;

    use super::*;
    use crate::services::cart::{LocalCart, shared};

    const DELAY: Duration = Duration::from_secs(3);

    async fn cart_with_items() -> SharedCart<LocalCart> {
        let mut cart = LocalCart::new();
        cart.add_item(ProductId::new(1), "199.99".parse().unwrap(), 2)
            .await
            .unwrap();
        shared(cart)
    }

    fn flow(
        cart: SharedCart<LocalCart>,
        gateway: SimulatedGateway,
    ) -> Arc<CheckoutFlow<LocalCart, SimulatedGateway>> {
        Arc::new(CheckoutFlow::new(cart, gateway, CurrencyCode::USD))
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_checkout_clears_cart() {
        let cart = cart_with_items().await;
        let flow = flow(Arc::clone(&cart), SimulatedGateway::approving(DELAY));

        let order = flow
            .submit(PaymentMethod::Card, "221B Baker Street")
            .await
            .unwrap();

        assert_eq!(order.total.amount, "399.98".parse::<Decimal>().unwrap());
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.shipping_address, "221B Baker Street");
        assert_eq!(
            flow.state(),
            CheckoutState::Complete {
                order,
                cart_cleared: true
            }
        );
        assert_eq!(cart.lock().await.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cart_never_reaches_processing() {
        let flow = flow(shared(LocalCart::new()), SimulatedGateway::approving(DELAY));

        let started = tokio::time::Instant::now();
        let err = flow.submit(PaymentMethod::Card, "Somewhere").await.unwrap_err();
        assert_eq!(err, CheckoutError::Validation(ValidationError::EmptyCart));
        assert_eq!(flow.status(), CheckoutStatus::Idle);
        // The gateway delay never ran.
        assert!(started.elapsed() < DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_address_is_rejected() {
        let cart = cart_with_items().await;
        let flow = flow(Arc::clone(&cart), SimulatedGateway::approving(DELAY));

        let err = flow.submit(PaymentMethod::PayPal, "  \t ").await.unwrap_err();
        assert_eq!(
            err,
            CheckoutError::Validation(ValidationError::EmptyShippingAddress)
        );
        assert_eq!(flow.status(), CheckoutStatus::Idle);
        assert_eq!(cart.lock().await.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_submit_while_processing_is_rejected() {
        let cart = cart_with_items().await;
        let flow = flow(cart, SimulatedGateway::approving(DELAY));

        let first = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.submit(PaymentMethod::Card, "Addr").await })
        };

        let mut states = flow.subscribe();
        states
            .wait_for(|state| state.status() == CheckoutStatus::Processing)
            .await
            .unwrap();

        let err = flow.submit(PaymentMethod::Card, "Addr").await.unwrap_err();
        assert_eq!(err, CheckoutError::InFlight);
        assert_eq!(flow.dismiss().unwrap_err(), CheckoutError::InFlight);

        let order = first.await.unwrap().unwrap();
        assert_eq!(flow.state().order(), Some(&order));
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_payment_keeps_cart_and_allows_retry() {
        let cart = cart_with_items().await;
        let flow = flow(
            Arc::clone(&cart),
            SimulatedGateway::declining(DELAY, "Card declined"),
        );

        let err = flow.submit(PaymentMethod::Card, "Addr").await.unwrap_err();
        assert!(matches!(err, CheckoutError::Payment(PaymentError::Declined(_))));
        assert!(matches!(
            flow.state(),
            CheckoutState::Failed { ref message } if message.contains("Card declined")
        ));
        assert_eq!(cart.lock().await.count(), 2);

        // Retrying from Failed starts a fresh attempt.
        let err = flow.submit(PaymentMethod::Card, "Addr").await.unwrap_err();
        assert!(matches!(err, CheckoutError::Payment(_)));

        flow.dismiss().unwrap();
        assert_eq!(flow.status(), CheckoutStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_must_be_dismissed() {
        let cart = cart_with_items().await;
        let flow = flow(Arc::clone(&cart), SimulatedGateway::approving(DELAY));
        flow.submit(PaymentMethod::Card, "Addr").await.unwrap();

        cart.lock()
            .await
            .add_item(ProductId::new(2), Decimal::TEN, 1)
            .await
            .unwrap();
        let err = flow.submit(PaymentMethod::Card, "Addr").await.unwrap_err();
        assert_eq!(err, CheckoutError::NotDismissed);

        flow.dismiss().unwrap();
        flow.dismiss().unwrap();
        assert_eq!(flow.status(), CheckoutStatus::Idle);
        flow.submit(PaymentMethod::Card, "Addr").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_payment_timeout_fails_attempt() {
        let cart = cart_with_items().await;
        let flow = Arc::new(
            CheckoutFlow::new(
                Arc::clone(&cart),
                SimulatedGateway::approving(Duration::from_secs(60)),
                CurrencyCode::USD,
            )
            .with_timeout(Some(Duration::from_secs(5))),
        );

        let err = flow.submit(PaymentMethod::Card, "Addr").await.unwrap_err();
        assert_eq!(err, CheckoutError::Timeout(Duration::from_secs(5)));
        assert_eq!(flow.status(), CheckoutStatus::Failed);
        assert_eq!(cart.lock().await.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_submit_still_finishes() {
        let cart = cart_with_items().await;
        let flow = flow(Arc::clone(&cart), SimulatedGateway::approving(DELAY));

        let abandoned = tokio::time::timeout(
            Duration::from_secs(1),
            flow.submit(PaymentMethod::Card, "Addr"),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(flow.status(), CheckoutStatus::Processing);

        let mut states = flow.subscribe();
        let finished = states
            .wait_for(|state| state.status().is_terminal())
            .await
            .unwrap()
            .clone();
        assert!(matches!(
            finished,
            CheckoutState::Complete {
                cart_cleared: true,
                ..
            }
        ));
        assert_eq!(cart.lock().await.count(), 0);

        flow.dismiss().unwrap();
        assert_eq!(flow.status(), CheckoutStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_items_added_during_payment_stay_in_cart() {
        let cart = cart_with_items().await;
        let flow = flow(Arc::clone(&cart), SimulatedGateway::approving(DELAY));

        let first = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.submit(PaymentMethod::Card, "Addr").await })
        };
        flow.subscribe()
            .wait_for(|state| state.status() == CheckoutStatus::Processing)
            .await
            .unwrap();

        {
            let mut cart = cart.lock().await;
            cart.add_item(ProductId::new(2), Decimal::TEN, 4).await.unwrap();
            cart.add_item(ProductId::new(1), "199.99".parse().unwrap(), 3)
                .await
                .unwrap();
        }

        let order = first.await.unwrap().unwrap();
        assert_eq!(order.item_count(), 2);
        assert!(order.lines.iter().all(|line| line.product_id == ProductId::new(1)));

        let cart = cart.lock().await;
        assert_eq!(cart.line_for(ProductId::new(2)).unwrap().quantity, 4);
        assert_eq!(cart.line_for(ProductId::new(1)).unwrap().quantity, 3);
        assert_eq!(cart.count(), 7);
    }

    #[tokio::test]
    async fn test_remove_ordered_skips_lines_already_gone() {
        let mut cart = LocalCart::new();
        cart.add_item(ProductId::new(1), Decimal::ONE, 2).await.unwrap();
        cart.add_item(ProductId::new(2), Decimal::ONE, 1).await.unwrap();
        let ordered = cart.lines().to_vec();

        let gone = ordered.first().unwrap().id;
        cart.remove_item(gone).await.unwrap();

        remove_ordered(&mut cart, &ordered).await.unwrap();
        assert!(cart.is_empty());
    }
}
