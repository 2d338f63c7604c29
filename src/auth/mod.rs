//! Identity boundary - sign-in, sign-up and sign-out against an identity provider.
//!
//! The rest of the crate only sees [`IdentityProvider`] and the [`Principal`] it returns.
//! [`LocalIdentityProvider`] is the bundled implementation over the `users` table.

pub mod local;

use crate::entities::user;
use crate::errors::AuthError;
use async_trait::async_trait;

pub use local::LocalIdentityProvider;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Result of an identity provider call.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// The authenticated identity that owns a namespace of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Namespace identifier
    pub uid: String,
    /// Sign-in email
    pub email: String,
    /// Display name, if the account has one
    pub name: Option<String>,
}

impl Principal {
    /// Name shown in the header: the account name, or the email's local part.
    #[must_use]
    pub fn display_label(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

impl From<&user::Model> for Principal {
    fn from(user: &user::Model) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            name: Some(user.name.clone()).filter(|name| !name.is_empty()),
        }
    }
}

/// An external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Signs in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Principal>;

    /// Creates an account and signs it in.
    async fn sign_up(&self, name: &str, email: &str, password: &str) -> AuthResult<Principal>;

    /// Ends the provider-side session.
    async fn sign_out(&self) -> AuthResult<()>;

    /// The principal currently signed in with the provider, used to resume a session.
    async fn current_principal(&self) -> Option<Principal>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_prefers_name() {
        let principal = Principal {
            uid: "u1".to_string(),
            email: "asha@example.com".to_string(),
            name: Some("Asha".to_string()),
        };
        assert_eq!(principal.display_label(), "Asha");
    }

    #[test]
    fn test_display_label_falls_back_to_email_local_part() {
        let principal = Principal {
            uid: "u1".to_string(),
            email: "asha.k@example.com".to_string(),
            name: None,
        };
        assert_eq!(principal.display_label(), "asha.k");

        let blank = Principal {
            name: Some("  ".to_string()),
            ..principal
        };
        assert_eq!(blank.display_label(), "asha.k");
    }
}
