//! Account commands.

use std::io::{self, Write};

use secrecy::SecretString;

use anufa_storefront::Storefront;
use anufa_storefront::services::auth::RegisterForm;

use crate::console::Console;
use crate::error::CliError;

pub async fn login(
    store: &Storefront,
    console: &mut Console,
    username: Option<String>,
) -> Result<(), CliError> {
    let username = match username {
        Some(username) => username,
        None => console.require("Username: ").await?,
    };
    let password = SecretString::from(console.require("Password: ").await?);

    let session = store.auth().login(&username, &password).await?;
    let name = session
        .user()
        .map_or_else(|| username.trim().to_string(), anufa_storefront::User::display_name);
    writeln!(io::stdout(), "Logged in as {name}")?;
    Ok(())
}

pub async fn register(store: &Storefront, console: &mut Console) -> Result<(), CliError> {
    let form = RegisterForm {
        username: console.require("Username: ").await?,
        email: console.require("Email: ").await?,
        password: SecretString::from(console.require("Password: ").await?),
        first_name: console.require("First name: ").await?,
        last_name: console.require("Last name: ").await?,
    };

    let session = store.auth().register(&form).await?;
    let name = session
        .user()
        .map_or_else(|| form.username.trim().to_string(), anufa_storefront::User::display_name);
    writeln!(io::stdout(), "Account created, logged in as {name}")?;
    Ok(())
}

pub async fn logout(store: &Storefront) -> Result<(), CliError> {
    match store.auth().restore().await? {
        Some(session) => {
            store.auth().logout(session).await?;
            writeln!(io::stdout(), "Logged out")?;
        }
        None => writeln!(io::stdout(), "Not logged in")?,
    }
    Ok(())
}

/// Check the stored token against the server.
pub async fn whoami(store: &Storefront) -> Result<(), CliError> {
    let session = store.auth().restore().await?.ok_or(CliError::NotLoggedIn)?;
    let lines = store.commerce().cart(&session).await?;

    let mut out = io::stdout();
    writeln!(out, "Logged in (session is valid)")?;
    writeln!(out, "Token file: {}", store.auth().token_store().path().display())?;
    writeln!(out, "Cart lines: {}", lines.len())?;
    Ok(())
}
