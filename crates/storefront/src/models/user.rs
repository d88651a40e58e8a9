//! Account types returned by the commerce API.

use serde::{Deserialize, Serialize};

use anufa_core::UserId;

/// The identity attached to an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Commerce API user ID.
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    /// Full name when the backend sent one, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.username.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_payload() {
        let user: User = serde_json::from_str(r#"{"id": 7, "username": "john"}"#).unwrap();
        assert_eq!(user.id, UserId::new(7));
        assert!(user.email.is_none());
        assert_eq!(user.display_name(), "john");
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let user: User = serde_json::from_str(
            r#"{"id": 7, "username": "john", "email": "john@example.com",
                "first_name": "John", "last_name": "Doe"}"#,
        )
        .unwrap();
        assert_eq!(user.display_name(), "John Doe");
    }
}
