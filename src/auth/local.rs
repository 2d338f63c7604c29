//! Local identity provider over the `users` table.
//!
//! Passwords are stored as bcrypt hashes. Emails are compared lowercased.
//! The signed-in principal is held in memory so [`IdentityProvider::current_principal`]
//! can resume a session without asking for credentials again.

use super::{AuthResult, IdentityProvider, MIN_PASSWORD_LENGTH, Principal};
use crate::{
    config::settings::AuthSettings,
    entities::{User, user},
    errors::{AuthError, AuthErrorCode},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Identity provider backed by the record store's `users` table.
pub struct LocalIdentityProvider {
    db: DatabaseConnection,
    allow_sign_up: bool,
    current: Mutex<Option<Principal>>,
}

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
// Minimum cost keeps the test suite fast
#[cfg(test)]
const HASH_COST: u32 = 4;

/// Hashes a password on the blocking pool.
async fn hash_password(password: &str) -> AuthResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await
        .map_err(|e| AuthError::new(AuthErrorCode::Other, e.to_string()))?
        .map_err(|e| AuthError::new(AuthErrorCode::Other, format!("Failed to hash password: {e}")))
}

/// Checks a password against a stored bcrypt hash on the blocking pool.
async fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::new(AuthErrorCode::Other, e.to_string()))?
        .map_err(|e| {
            AuthError::new(
                AuthErrorCode::Other,
                format!("Password verification error: {e}"),
            )
        })
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

fn store_error(err: &DbErr) -> AuthError {
    AuthError::new(AuthErrorCode::Other, err.to_string())
}

impl LocalIdentityProvider {
    /// Creates a provider over a connection whose `users` table exists.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: &AuthSettings) -> Self {
        Self {
            db,
            allow_sign_up: settings.allow_sign_up,
            current: Mutex::new(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| store_error(&e))
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Principal> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthError::new(
                AuthErrorCode::InvalidEmail,
                "The email address is badly formatted.",
            ));
        }

        let account = self.find_by_email(&email).await?.ok_or_else(|| {
            AuthError::new(
                AuthErrorCode::UserNotFound,
                "There is no user record corresponding to this identifier.",
            )
        })?;

        if account.disabled {
            warn!("Sign-in attempt on disabled account");
            return Err(AuthError::new(
                AuthErrorCode::UserDisabled,
                "The user account has been disabled.",
            ));
        }
        if !verify_password(password, &account.password_hash).await? {
            return Err(AuthError::new(
                AuthErrorCode::WrongPassword,
                "The password is invalid.",
            ));
        }

        let principal = Principal::from(&account);
        let mut active_model: user::ActiveModel = account.into();
        active_model.last_login = Set(Utc::now());
        active_model
            .update(&self.db)
            .await
            .map_err(|e| store_error(&e))?;

        info!(uid = %principal.uid, "Signed in");
        *self.current.lock().await = Some(principal.clone());
        Ok(principal)
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, name: &str, email: &str, password: &str) -> AuthResult<Principal> {
        if !self.allow_sign_up {
            return Err(AuthError::new(
                AuthErrorCode::OperationNotAllowed,
                "Sign-up is disabled.",
            ));
        }

        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthError::new(
                AuthErrorCode::InvalidEmail,
                "The email address is badly formatted.",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::new(
                AuthErrorCode::WeakPassword,
                "Password should be at least 6 characters.",
            ));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::new(
                AuthErrorCode::EmailAlreadyInUse,
                "The email address is already in use by another account.",
            ));
        }

        let password_hash = hash_password(password).await?;
        let now = Utc::now();
        let account = user::ActiveModel {
            uid: Set(Uuid::new_v4().to_string()),
            name: Set(name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            disabled: Set(false),
            created_at: Set(now),
            last_login: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| store_error(&e))?;

        let principal = Principal::from(&account);
        info!(uid = %principal.uid, "Account created");
        *self.current.lock().await = Some(principal.clone());
        Ok(principal)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        if let Some(principal) = self.current.lock().await.take() {
            info!(uid = %principal.uid, "Signed out");
        }
        Ok(())
    }

    async fn current_principal(&self) -> Option<Principal> {
        self.current.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    async fn provider(allow_sign_up: bool) -> crate::errors::Result<LocalIdentityProvider> {
        let db = setup_test_db().await?;
        Ok(LocalIdentityProvider::new(db, &AuthSettings { allow_sign_up }))
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("ab.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
    }

    #[tokio::test]
    async fn test_password_hash_is_salted_bcrypt() -> crate::errors::Result<()> {
        let first = hash_password("secret").await?;
        let second = hash_password("secret").await?;
        assert!(first.starts_with("$2"));
        assert_ne!(first, second);
        assert!(verify_password("secret", &first).await?);
        assert!(!verify_password("Secret", &first).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_hash_is_not_the_password() -> crate::errors::Result<()> {
        let provider = provider(true).await?;
        provider.sign_up("Asha", "asha@example.com", "hunter22").await?;

        let stored = User::find()
            .filter(user::Column::Email.eq("asha@example.com"))
            .one(&provider.db)
            .await?
            .unwrap();
        assert_ne!(stored.password_hash, "hunter22");
        assert!(bcrypt::verify("hunter22", &stored.password_hash).unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() -> crate::errors::Result<()> {
        let provider = provider(true).await?;

        let created = provider
            .sign_up("Asha", "Asha@Example.com", "hunter22")
            .await?;
        assert_eq!(created.email, "asha@example.com");
        assert_eq!(provider.current_principal().await, Some(created.clone()));

        provider.sign_out().await?;
        assert!(provider.current_principal().await.is_none());

        let signed_in = provider.sign_in("asha@example.com", "hunter22").await?;
        assert_eq!(signed_in.uid, created.uid);
        assert_eq!(signed_in.display_label(), "Asha");

        Ok(())
    }

    #[tokio::test]
    async fn test_sign_up_error_codes() -> crate::errors::Result<()> {
        let provider = provider(true).await?;
        provider.sign_up("Asha", "asha@example.com", "hunter22").await?;

        let err = provider
            .sign_up("Again", "asha@example.com", "hunter22")
            .await
            .unwrap_err();
        assert_eq!(err.code, AuthErrorCode::EmailAlreadyInUse);

        let err = provider.sign_up("X", "not-an-email", "hunter22").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::InvalidEmail);

        let err = provider.sign_up("X", "x@example.com", "12345").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::WeakPassword);

        let closed = self::provider(false).await?;
        let err = closed.sign_up("X", "x@example.com", "hunter22").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::OperationNotAllowed);

        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_error_codes() -> crate::errors::Result<()> {
        let provider = provider(true).await?;
        provider.sign_up("Asha", "asha@example.com", "hunter22").await?;
        provider.sign_out().await?;

        let err = provider.sign_in("nobody@example.com", "x").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::UserNotFound);

        let err = provider.sign_in("asha@example.com", "wrong!").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::WrongPassword);

        let err = provider.sign_in("asha", "hunter22").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::InvalidEmail);

        // Disable the account directly
        let account = User::find()
            .filter(user::Column::Email.eq("asha@example.com"))
            .one(&provider.db)
            .await?
            .unwrap();
        let mut active_model: user::ActiveModel = account.into();
        active_model.disabled = Set(true);
        active_model.update(&provider.db).await?;

        let err = provider.sign_in("asha@example.com", "hunter22").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::UserDisabled);
        assert!(provider.current_principal().await.is_none());

        Ok(())
    }
}
