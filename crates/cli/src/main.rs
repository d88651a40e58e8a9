//! Anufa CLI - Command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! anufa products --category 2
//! anufa search wireless headphones
//!
//! # Log in, then manage the server cart
//! anufa login -u john
//! anufa cart add 1 2
//! anufa cart show
//!
//! # Interactive session with checkout
//! anufa shell
//! ```
//!
//! Configuration comes from the environment (and `.env`); see
//! `StorefrontConfig::from_env`. Logging is controlled with `RUST_LOG`.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod commands;
mod console;
mod error;
mod output;

use std::io::Write;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anufa_core::{CartLineId, CategoryId, ProductId};
use anufa_storefront::api::types::DEFAULT_RECOMMENDATION_LIMIT;
use anufa_storefront::{Storefront, StorefrontConfig};

use commands::catalog::RecommendOptions;
use console::Console;
use error::CliError;

#[derive(Parser)]
#[command(name = "anufa")]
#[command(author, version, about = "Anufa storefront in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Only show products in this category
        #[arg(short, long)]
        category: Option<CategoryId>,
    },
    /// List featured products
    Featured,
    /// List categories
    Categories,
    /// Show one product
    Product { id: ProductId },
    /// Search products by name and description
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Recommended products
    Recommend {
        #[arg(short, long, default_value_t = DEFAULT_RECOMMENDATION_LIMIT)]
        limit: u32,

        /// Recommend products similar to this one
        #[arg(short, long)]
        product: Option<ProductId>,

        /// Recommend products from this category
        #[arg(short, long)]
        category: Option<CategoryId>,
    },
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create an account
    Register,
    /// Forget the stored session
    Logout,
    /// Check the stored session
    Whoami,
    /// Manage the server cart (requires login)
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Interactive shopping session with checkout
    Shell {
        /// Make the simulated payment gateway decline every charge
        #[arg(long)]
        decline: bool,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product: ProductId,
        #[arg(default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a cart line
    Remove { line: CartLineId },
    /// Change the quantity of a product already in the cart
    Set { product: ProductId, quantity: u32 },
    /// Remove every line
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "anufa=info,anufa_storefront=info".into());

    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let store = Storefront::new(config).expect("Failed to create HTTP clients");

    if let Err(e) = run(&store, cli).await {
        if e.is_auth() {
            if let Err(clear_err) = store.auth().invalidate().await {
                tracing::warn!(error = %clear_err, "Could not clear stored session");
            }
        }
        if e.is_server_fault() {
            sentry::capture_error(&e);
        }
        tracing::error!(error = %e, "Command failed");

        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "Error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(store: &Storefront, cli: Cli) -> Result<(), CliError> {
    let mut console = Console::new();

    match cli.command {
        Commands::Products { category } => commands::catalog::products(store, category).await?,
        Commands::Featured => commands::catalog::featured(store).await?,
        Commands::Categories => commands::catalog::categories(store).await?,
        Commands::Product { id } => commands::catalog::product(store, id).await?,
        Commands::Search { query } => commands::catalog::search(store, &query.join(" ")).await?,
        Commands::Recommend {
            limit,
            product,
            category,
        } => {
            let session = store.auth().restore().await?;
            let options = RecommendOptions {
                limit,
                product,
                category,
            };
            commands::catalog::recommend(store, session.as_ref(), options).await?;
        }
        Commands::Login { username } => {
            commands::auth::login(store, &mut console, username).await?;
        }
        Commands::Register => commands::auth::register(store, &mut console).await?,
        Commands::Logout => commands::auth::logout(store).await?,
        Commands::Whoami => commands::auth::whoami(store).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(store).await?,
            CartAction::Add { product, quantity } => {
                commands::cart::add(store, product, quantity).await?;
            }
            CartAction::Remove { line } => commands::cart::remove(store, line).await?,
            CartAction::Set { product, quantity } => {
                commands::cart::set(store, product, quantity).await?;
            }
            CartAction::Clear => commands::cart::clear(store).await?,
        },
        Commands::Shell { decline } => {
            commands::shell::run(store, &mut console, decline).await?;
        }
    }
    Ok(())
}
