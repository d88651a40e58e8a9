//! Interactive shopping session.
//!
//! The shell keeps one cart for its whole lifetime: the server cart when a
//! stored session is valid, otherwise a local cart. Checkout runs against
//! that cart with the simulated payment gateway, in the background, so the
//! shell keeps reading commands while a payment is processing.

use std::io::{self, Write};
use std::str::FromStr;

use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use anufa_core::{CartLineId, CategoryId, Order, PaymentMethod, ProductId};
use anufa_storefront::api::types::DEFAULT_RECOMMENDATION_LIMIT;
use anufa_storefront::services::cart::{CartStore, LocalCart, SessionCart, SharedCart, shared};
use anufa_storefront::services::checkout::{
    CheckoutError, CheckoutFlow, CheckoutState, SimulatedGateway,
};
use anufa_storefront::{Session, Storefront};

use crate::commands::catalog::{self, RecommendOptions, find_product};
use crate::console::Console;
use crate::error::CliError;
use crate::output;

const HELP: &str = "\
Commands:
  products [CATEGORY]        list products, optionally in one category
  featured                   featured products
  categories                 list categories
  product ID                 product details
  search QUERY...            search by name and description
  recommend [LIMIT]          recommended products
  cart                       show the cart
  add ID [QTY]               add a product (default quantity 1)
  set ID QTY                 change the quantity of a product in the cart
  remove LINE                remove a cart line
  clear                      empty the cart
  checkout METHOD ADDRESS... pay with card or paypal and ship to ADDRESS
                             (runs in the background)
  status                     show the checkout state
  dismiss                    start over after a finished checkout
  help                       this text
  quit                       leave the shell";

enum Flow {
    Continue,
    Quit,
}

struct Shell<'a> {
    store: &'a Storefront,
    session: Option<Session>,
    cart: SharedCart<SessionCart>,
    checkout: CheckoutFlow<SessionCart, SimulatedGateway>,
    attempts: JoinSet<Result<Order, CheckoutError>>,
}

/// Run the shell until `quit` or end of input.
pub async fn run(store: &Storefront, console: &mut Console, decline: bool) -> Result<(), CliError> {
    let mut session = store.auth().restore().await?;
    let cart = match store.open_cart(session.as_ref()).await {
        Ok(cart) => cart,
        Err(e) if e.is_auth() => {
            store.auth().invalidate().await?;
            session = None;
            writeln!(
                io::stderr(),
                "Your session has expired; using a local cart. Log in again to use your saved cart."
            )?;
            SessionCart::Local(LocalCart::new())
        }
        Err(e) => return Err(e.into()),
    };
    info!(remote = cart.is_remote(), "Shell started");

    let cart = shared(cart);
    let gateway = if decline {
        SimulatedGateway::declining(store.config().checkout.payment_delay, "Card declined")
    } else {
        store.gateway()
    };
    let mut shell = Shell {
        store,
        session,
        checkout: store.checkout_with(cart.clone(), gateway),
        cart,
        attempts: JoinSet::new(),
    };
    let mut updates = shell.checkout.subscribe();

    writeln!(io::stdout(), "Type `help` for commands.")?;
    loop {
        tokio::select! {
            line = console.prompt("anufa> ") => {
                let Some(line) = line? else {
                    break;
                };
                let mut words = line.split_whitespace();
                let Some(command) = words.next() else {
                    continue;
                };
                let args: Vec<&str> = words.collect();

                match shell.execute(command, &args).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => shell.report(&e).await?,
                }
            }
            Some(joined) = shell.attempts.join_next() => shell.finish(joined).await?,
            Ok(()) = updates.changed() => {
                let status = updates.borrow_and_update().status();
                if status.is_in_flight() {
                    writeln!(io::stdout(), "\n{status}...")?;
                }
            }
        }
    }

    shell.wait_for_checkout().await
}

impl Shell<'_> {
    async fn execute(&mut self, command: &str, args: &[&str]) -> Result<Flow, CliError> {
        let store = self.store;
        match command {
            "help" | "?" => writeln!(io::stdout(), "{HELP}")?,
            "products" => catalog::products(store, optional_arg::<CategoryId>(args, 0, "CATEGORY")?).await?,
            "featured" => catalog::featured(store).await?,
            "categories" => catalog::categories(store).await?,
            "product" => catalog::product(store, arg(args, 0, "ID")?).await?,
            "search" => catalog::search(store, &args.join(" ")).await?,
            "recommend" => {
                let options = RecommendOptions {
                    limit: optional_arg(args, 0, "LIMIT")?.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT),
                    product: None,
                    category: None,
                };
                catalog::recommend(store, self.session.as_ref(), options).await?;
            }
            "cart" => self.show_cart().await?,
            "add" => {
                let product_id: ProductId = arg(args, 0, "ID")?;
                let quantity = optional_arg(args, 1, "QTY")?.unwrap_or(1);
                let product = find_product(store, product_id).await?;
                self.cart.lock().await.add_product(&product, quantity).await?;
                self.show_cart().await?;
            }
            "set" => {
                let product_id = arg(args, 0, "ID")?;
                let quantity = arg(args, 1, "QTY")?;
                self.cart.lock().await.set_quantity(product_id, quantity).await?;
                self.show_cart().await?;
            }
            "remove" => {
                let line_id: CartLineId = arg(args, 0, "LINE")?;
                self.cart.lock().await.remove_item(line_id).await?;
                self.show_cart().await?;
            }
            "clear" => {
                self.cart.lock().await.clear().await?;
                self.show_cart().await?;
            }
            "checkout" => {
                let method: PaymentMethod = arg(args, 0, "METHOD")?;
                let address = args.get(1..).unwrap_or_default().join(" ");
                let flow = self.checkout.clone();
                self.attempts
                    .spawn(async move { flow.submit(method, &address).await });
            }
            "status" => {
                output::checkout_state(&mut io::stdout(), store.formatter(), &self.checkout.state())?;
            }
            "dismiss" => {
                self.checkout.dismiss()?;
                writeln!(io::stdout(), "Ready for a new order")?;
            }
            "quit" | "exit" => return Ok(Flow::Quit),
            other => {
                return Err(CliError::Usage(format!(
                    "Unknown command `{other}`. Type `help` for commands."
                )));
            }
        }
        Ok(Flow::Continue)
    }

    async fn show_cart(&self) -> Result<(), CliError> {
        let cart = self.cart.lock().await;
        output::cart(&mut io::stdout(), self.store.formatter(), cart.lines())?;
        if cart.is_stale() {
            output::stale_note(&mut io::stdout())?;
        }
        Ok(())
    }

    /// Print the outcome of a checkout attempt.
    async fn finish(
        &mut self,
        joined: Result<Result<Order, CheckoutError>, JoinError>,
    ) -> Result<(), CliError> {
        let order = match joined {
            Ok(Ok(order)) => order,
            Ok(Err(e)) => return self.report(&CliError::from(e)).await,
            Err(e) => {
                tracing::error!(error = %e, "Checkout task failed");
                return self.report(&CliError::from(CheckoutError::Interrupted)).await;
            }
        };

        let mut out = io::stdout();
        output::order(&mut out, self.store.formatter(), &order)?;
        if matches!(
            self.checkout.state(),
            CheckoutState::Complete {
                cart_cleared: false,
                ..
            }
        ) {
            output::unsettled_note(&mut out)?;
        }
        writeln!(out, "Type `dismiss` to start a new order.")?;
        Ok(())
    }

    /// Let a running checkout finish before the shell exits.
    async fn wait_for_checkout(&mut self) -> Result<(), CliError> {
        if !self.attempts.is_empty() {
            writeln!(io::stdout(), "Waiting for checkout to finish...")?;
        }
        while let Some(joined) = self.attempts.join_next().await {
            self.finish(joined).await?;
        }
        Ok(())
    }

    /// Print an error and keep the shell running. A rejected session is
    /// discarded and the shell continues with an empty local cart.
    async fn report(&mut self, error: &CliError) -> Result<(), CliError> {
        if error.is_auth() && self.session.is_some() {
            warn!("Session rejected during shell, switching to a local cart");
            self.store.auth().invalidate().await?;
            self.session = None;
            *self.cart.lock().await = SessionCart::Local(LocalCart::new());
        }
        if error.is_server_fault() {
            sentry::capture_error(error);
            tracing::error!(error = %error, "Command failed");
        }
        writeln!(io::stderr(), "Error: {}", error.user_message())?;
        Ok(())
    }
}

fn arg<T: FromStr>(args: &[&str], index: usize, name: &str) -> Result<T, CliError> {
    optional_arg(args, index, name)?
        .ok_or_else(|| CliError::Usage(format!("Missing {name}. Type `help` for usage.")))
}

fn optional_arg<T: FromStr>(args: &[&str], index: usize, name: &str) -> Result<Option<T>, CliError> {
    args.get(index)
        .map(|raw| {
            raw.parse()
                .map_err(|_| CliError::Usage(format!("Invalid {name}: {raw}")))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use anufa_core::CheckoutStatus;
    use anufa_storefront::{StorefrontConfig, StorefrontError};
    use rust_decimal::Decimal;

    use super::*;

    fn offline_store() -> Storefront {
        let token_file = std::env::temp_dir()
            .join(format!("anufa-shell-{}", std::process::id()))
            .join("token");
        let token_file = token_file.display().to_string();
        let config = StorefrontConfig::from_lookup(|key| match key {
            "ANUFA_TOKEN_FILE" => Some(token_file.clone()),
            "ANUFA_PAYMENT_DELAY_MS" => Some("200".to_string()),
            _ => None,
        })
        .unwrap();
        Storefront::new(config).unwrap()
    }

    fn local_shell(store: &Storefront) -> Shell<'_> {
        let cart = shared(SessionCart::Local(LocalCart::new()));
        Shell {
            store,
            session: None,
            checkout: store.checkout(cart.clone()),
            cart,
            attempts: JoinSet::new(),
        }
    }

    #[tokio::test]
    async fn test_commands_run_while_checkout_is_processing() {
        let store = offline_store();
        let mut shell = local_shell(&store);
        shell
            .cart
            .lock()
            .await
            .add_item(ProductId::new(1), Decimal::TEN, 2)
            .await
            .unwrap();

        let mut states = shell.checkout.subscribe();
        let started = shell.execute("checkout", &["card", "1", "Main", "St"]).await;
        assert!(matches!(started, Ok(Flow::Continue)));
        states
            .wait_for(|state| state.status() == CheckoutStatus::Processing)
            .await
            .unwrap();

        assert!(matches!(shell.execute("status", &[]).await, Ok(Flow::Continue)));
        assert!(matches!(shell.execute("cart", &[]).await, Ok(Flow::Continue)));
        assert!(matches!(
            shell.execute("dismiss", &[]).await,
            Err(CliError::Storefront(StorefrontError::Checkout(
                CheckoutError::InFlight
            )))
        ));

        // A second checkout is accepted by the shell and refused by the flow.
        shell.execute("checkout", &["card", "1", "Main", "St"]).await.unwrap();

        let mut outcomes = Vec::new();
        while let Some(joined) = shell.attempts.join_next().await {
            outcomes.push(joined.unwrap());
        }
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().any(Result::is_ok));
        assert!(outcomes.contains(&Err(CheckoutError::InFlight)));
        assert_eq!(shell.checkout.status(), CheckoutStatus::Complete);
        assert_eq!(shell.cart.lock().await.count(), 0);
    }

    #[test]
    fn test_args_are_parsed_by_position() {
        let args = ["3", "2"];
        let product: ProductId = arg(&args, 0, "ID").unwrap();
        let quantity: u32 = arg(&args, 1, "QTY").unwrap();
        assert_eq!(product, ProductId::new(3));
        assert_eq!(quantity, 2);

        let missing: Option<u32> = optional_arg(&args, 2, "QTY").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_bad_args_are_usage_errors() {
        let err = arg::<u32>(&["-1"], 0, "QTY").unwrap_err();
        assert!(matches!(err, CliError::Usage(message) if message == "Invalid QTY: -1"));

        let err = arg::<ProductId>(&[], 0, "ID").unwrap_err();
        assert!(matches!(err, CliError::Usage(message) if message.starts_with("Missing ID")));

        let err = arg::<PaymentMethod>(&["bitcoin"], 0, "METHOD").unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }
}
