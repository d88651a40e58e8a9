//! Server-backed cart for logged-in shoppers.
//!
//! Every mutation is sent to the commerce API first. Only once the server has
//! accepted it is the local snapshot replaced with a fresh copy of the server
//! cart, so a failed call leaves the snapshot exactly as it was.
//!
//! An error from a mutation means the server did not apply it. If the write
//! succeeds but the cart cannot be re-read afterwards, the mutation still
//! returns `Ok`; the snapshot is marked stale and re-read before the next
//! mutation.

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use anufa_core::{CartLine, CartLineId, ProductId};

use super::{CartStore, MAX_LINE_QUANTITY, not_in_cart, validate_quantity};
use crate::api::{ApiError, CommerceClient};
use crate::error::{StorefrontError, ValidationError};
use crate::models::Session;

/// The logged-in shopper's cart on the commerce API.
#[derive(Debug)]
pub struct RemoteCart {
    client: CommerceClient,
    session: Session,
    lines: Vec<CartLine>,
    stale: bool,
}

impl RemoteCart {
    /// Fetch the server cart for `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched.
    pub async fn load(client: CommerceClient, session: Session) -> Result<Self, StorefrontError> {
        let lines = client.cart(&session).await?;
        Ok(Self {
            client,
            session,
            lines,
            stale: false,
        })
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Replace the snapshot with the server's current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be fetched; the snapshot is kept.
    pub async fn refresh(&mut self) -> Result<(), StorefrontError> {
        self.lines = self.client.cart(&self.session).await?;
        self.stale = false;
        Ok(())
    }

    /// Re-read the cart after a write the server accepted. A failed read
    /// leaves the write in place and marks the snapshot stale.
    async fn resync(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Cart change applied but the cart could not be re-read");
            self.stale = true;
        }
    }

    /// Re-read a stale snapshot before acting on it.
    async fn ensure_fresh(&mut self) -> Result<(), StorefrontError> {
        if self.stale {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Remove one line on the server, treating "already gone" as success.
    async fn delete_line(&self, line_id: CartLineId) -> Result<(), StorefrontError> {
        match self.client.remove_from_cart(&self.session, line_id).await {
            Ok(()) | Err(ApiError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CartStore for RemoteCart {
    /// The server records its own catalog price, so `unit_price` is not sent.
    #[instrument(skip(self, _unit_price), fields(product_id = %product_id))]
    async fn add_item(
        &mut self,
        product_id: ProductId,
        _unit_price: Decimal,
        quantity: u32,
    ) -> Result<(), StorefrontError> {
        let quantity = validate_quantity(quantity)?;
        self.ensure_fresh().await?;
        let existing = self.line_for(product_id).map_or(0, |line| line.quantity);
        if existing.saturating_add(quantity) > MAX_LINE_QUANTITY {
            return Err(ValidationError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }

        self.client
            .add_to_cart(&self.session, product_id, i64::from(quantity))
            .await?;
        self.resync().await;
        Ok(())
    }

    #[instrument(skip(self), fields(line_id = %line_id))]
    async fn remove_item(&mut self, line_id: CartLineId) -> Result<(), StorefrontError> {
        self.delete_line(line_id).await?;
        self.resync().await;
        Ok(())
    }

    /// Sent as an add of the difference; the commerce API has no set call.
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), StorefrontError> {
        let quantity = validate_quantity(quantity)?;
        self.ensure_fresh().await?;
        let current = self
            .line_for(product_id)
            .map(|line| line.quantity)
            .ok_or_else(|| not_in_cart(product_id))?;

        let delta = i64::from(quantity) - i64::from(current);
        if delta == 0 {
            return Ok(());
        }

        self.client
            .add_to_cart(&self.session, product_id, delta)
            .await?;
        self.resync().await;
        Ok(())
    }

    /// Removes lines one at a time and stops at the first failure.
    #[instrument(skip(self), fields(lines = self.lines.len()))]
    async fn clear(&mut self) -> Result<(), StorefrontError> {
        self.ensure_fresh().await?;
        let line_ids: Vec<CartLineId> = self.lines.iter().map(|line| line.id).collect();

        for line_id in line_ids {
            if let Err(e) = self.delete_line(line_id).await {
                // Earlier lines are already gone on the server.
                self.resync().await;
                return Err(e);
            }
        }

        self.resync().await;
        Ok(())
    }

    fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    fn is_stale(&self) -> bool {
        self.stale
    }
}
