//! Authenticated session context.
//!
//! A [`Session`] replaces ambient global auth state: it is created by a
//! successful login (or restored from the persisted token) and passed
//! explicitly to every component that calls the commerce API on the shopper's
//! behalf. Clones share the same token.

use std::sync::Arc;

use secrecy::SecretString;

use anufa_core::UserId;

use super::user::User;

/// A logged-in shopper's credentials and identity.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: SecretString,
    /// Unknown when the session was restored from a stored token.
    user: Option<User>,
}

impl Session {
    #[must_use]
    pub fn new(token: SecretString, user: Option<User>) -> Self {
        Self {
            inner: Arc::new(SessionInner { token, user }),
        }
    }

    /// Bearer token sent with every authenticated request.
    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.inner.token
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.inner.user.as_ref()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.inner.user.as_ref().map(|user| user.id)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.inner.user)
            .finish()
    }
}
