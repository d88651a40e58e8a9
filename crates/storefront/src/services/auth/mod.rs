//! Authentication service.
//!
//! Exchanges credentials for a bearer token with the commerce API and keeps
//! that token in a [`TokenStore`] so the session survives restarts.

mod token_store;

pub use token_store::TokenStore;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use anufa_core::Email;

use crate::api::{ApiError, CommerceClient};
use crate::api::types::RegisterRequest;
use crate::error::{StorefrontError, ValidationError};
use crate::models::Session;

/// Account details collected by the registration form.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
}

/// Authentication service.
#[derive(Clone)]
pub struct Authenticator {
    client: CommerceClient,
    tokens: TokenStore,
}

impl Authenticator {
    #[must_use]
    pub const fn new(client: CommerceClient, tokens: TokenStore) -> Self {
        Self { client, tokens }
    }

    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields (nothing is sent),
    /// [`StorefrontError::InvalidCredentials`] for wrong credentials, or another error if
    /// the request or saving the token fails.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Session, StorefrontError> {
        let username = required(username, "Username")?;
        let password = password.expose_secret();
        if password.is_empty() {
            return Err(ValidationError::MissingField { field: "Password" }.into());
        }

        let response = match self.client.login(username, password).await {
            Ok(response) => response,
            Err(ApiError::Unauthorized(_)) => return Err(StorefrontError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };
        let session = Session::new(SecretString::from(response.token), Some(response.user));
        self.tokens.save(session.token()).await?;

        info!(user_id = ?session.user_id(), "Logged in");
        Ok(session)
    }

    /// Create an account and log in to it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields or a malformed email
    /// (nothing is sent), an API error if the username or email is taken, or
    /// another error if the request or saving the token fails.
    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn register(&self, form: &RegisterForm) -> Result<Session, StorefrontError> {
        let username = required(&form.username, "Username")?;
        let email = Email::parse(&form.email).map_err(ValidationError::from)?;
        let password = form.password.expose_secret();
        if password.is_empty() {
            return Err(ValidationError::MissingField { field: "Password" }.into());
        }
        let first_name = required(&form.first_name, "First name")?;
        let last_name = required(&form.last_name, "Last name")?;

        let request = RegisterRequest {
            username,
            email: email.as_str(),
            password,
            first_name,
            last_name,
        };
        let response = self.client.register(&request).await?;
        let session = Session::new(SecretString::from(response.token), Some(response.user));
        self.tokens.save(session.token()).await?;

        info!(user_id = ?session.user_id(), "Registered new account");
        Ok(session)
    }

    /// End the session and forget the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token file cannot be removed.
    #[instrument(skip_all)]
    pub async fn logout(&self, session: Session) -> Result<(), StorefrontError> {
        drop(session);
        self.tokens.clear().await?;
        info!("Logged out");
        Ok(())
    }

    /// Rebuild a session from the stored token, if there is one.
    ///
    /// The user identity is not known until the server is asked; the token
    /// alone authorises cart calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the token file exists but cannot be read.
    pub async fn restore(&self) -> Result<Option<Session>, StorefrontError> {
        Ok(self
            .tokens
            .load()
            .await?
            .map(|token| Session::new(token, None)))
    }

    /// Discard the stored token after the server rejected it.
    ///
    /// # Errors
    ///
    /// Returns an error if the token file cannot be removed.
    pub async fn invalidate(&self) -> Result<(), StorefrontError> {
        warn!("Session rejected by server, clearing stored token");
        self.tokens.clear().await?;
        Ok(())
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::config::ApiConfig;

    fn authenticator(name: &str) -> Authenticator {
        let config = ApiConfig {
            base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            ai_base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            request_timeout: Duration::from_secs(1),
        };
        let client = CommerceClient::new(&config, Duration::from_secs(60)).unwrap();
        let path = std::env::temp_dir()
            .join(format!("anufa-auth-{name}-{}", std::process::id()))
            .join("token");
        Authenticator::new(client, TokenStore::new(path))
    }

    fn form() -> RegisterForm {
        RegisterForm {
            username: "john".to_string(),
            email: "john@example.com".to_string(),
            password: SecretString::from("hunter22"),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_rejects_blank_fields_without_network() {
        let auth = authenticator("blank-login");

        let err = auth
            .login("   ", &SecretString::from("pw"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorefrontError::Validation(ValidationError::MissingField { field: "Username" })
        ));

        let err = auth.login("john", &SecretString::from("")).await.unwrap_err();
        assert!(matches!(
            err,
            StorefrontError::Validation(ValidationError::MissingField { field: "Password" })
        ));
    }

    #[tokio::test]
    async fn test_register_validates_every_field() {
        let auth = authenticator("register-validation");

        let mut bad_email = form();
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            auth.register(&bad_email).await.unwrap_err(),
            StorefrontError::Validation(ValidationError::InvalidEmail(_))
        ));

        let mut no_last_name = form();
        no_last_name.last_name = String::new();
        assert!(matches!(
            auth.register(&no_last_name).await.unwrap_err(),
            StorefrontError::Validation(ValidationError::MissingField { field: "Last name" })
        ));
    }

    #[tokio::test]
    async fn test_restore_and_invalidate() {
        let auth = authenticator("restore");
        assert!(auth.restore().await.unwrap().is_none());

        auth.token_store()
            .save(&SecretString::from("stored-token"))
            .await
            .unwrap();
        let session = auth.restore().await.unwrap().unwrap();
        assert_eq!(session.token().expose_secret(), "stored-token");
        assert!(session.user().is_none());

        auth.invalidate().await.unwrap();
        assert!(auth.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_token() {
        let auth = authenticator("logout");
        auth.token_store()
            .save(&SecretString::from("t"))
            .await
            .unwrap();
        let session = auth.restore().await.unwrap().unwrap();

        auth.logout(session).await.unwrap();
        assert!(auth.restore().await.unwrap().is_none());
    }
}
