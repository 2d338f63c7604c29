//! Unified error types for `cashbook`.
//!
//! Three families reach the command layer: validation failures raised locally
//! before any store call, authentication failures from the identity provider,
//! and store failures which all collapse into [`Error::RemoteUnavailable`].

use crate::store::{RecordId, RecordKind};
use sea_orm::DbErr;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings or environment could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// User input rejected before any remote call was attempted
    #[error("Validation error: {message}")]
    Validation {
        /// Message shown to the user
        message: String,
    },

    /// A store operation was attempted without a signed-in principal
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The identity provider rejected the request
    #[error(transparent)]
    Authentication(#[from] AuthError),

    /// Any failure talking to the record store
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(#[from] DbErr),

    /// An update targeted a record missing from the principal's namespace
    #[error("{kind} record {id} not found")]
    RecordNotFound {
        /// Which collection was addressed
        kind: RecordKind,
        /// Identifier that was not found
        id: RecordId,
    },

    /// I/O error (shell input, settings file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True when the error was raised locally before any store call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Error codes reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// `auth/invalid-email`
    InvalidEmail,
    /// `auth/user-disabled`
    UserDisabled,
    /// `auth/user-not-found`
    UserNotFound,
    /// `auth/wrong-password`
    WrongPassword,
    /// `auth/email-already-in-use`
    EmailAlreadyInUse,
    /// `auth/weak-password`
    WeakPassword,
    /// `auth/operation-not-allowed`
    OperationNotAllowed,
    /// Anything else the provider reports
    Other,
}

impl AuthErrorCode {
    /// Provider code string, e.g. `auth/wrong-password`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "auth/invalid-email",
            Self::UserDisabled => "auth/user-disabled",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::OperationNotAllowed => "auth/operation-not-allowed",
            Self::Other => "auth/other",
        }
    }
}

/// Which identity flow produced an [`AuthError`]; each maps a different subset of codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    /// Email/password sign-in
    SignIn,
    /// Account creation
    SignUp,
}

/// Failure reported by an [`crate::auth::IdentityProvider`].
#[derive(Debug, Clone, Error)]
#[error("{message} ({})", .code.as_str())]
pub struct AuthError {
    /// Provider error code
    pub code: AuthErrorCode,
    /// Raw provider message, used when the code has no mapped text
    pub message: String,
}

impl AuthError {
    /// Builds an error with the given code and raw provider message.
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Message shown to the user for this error in the given flow.
    ///
    /// Codes without a mapping in that flow fall back to the raw provider message.
    #[must_use]
    pub fn user_message(&self, flow: AuthFlow) -> String {
        let (prefix, mapped) = match flow {
            AuthFlow::SignIn => (
                "Login failed. ",
                match self.code {
                    AuthErrorCode::InvalidEmail => Some("Invalid email address."),
                    AuthErrorCode::UserDisabled => Some("This account has been disabled."),
                    AuthErrorCode::UserNotFound => Some("No account found with this email."),
                    AuthErrorCode::WrongPassword => Some("Incorrect password."),
                    _ => None,
                },
            ),
            AuthFlow::SignUp => (
                "Signup failed. ",
                match self.code {
                    AuthErrorCode::EmailAlreadyInUse => Some("Email already in use."),
                    AuthErrorCode::InvalidEmail => Some("Invalid email address."),
                    AuthErrorCode::WeakPassword => Some("Password is too weak."),
                    AuthErrorCode::OperationNotAllowed => {
                        Some("Email/password accounts are not enabled.")
                    }
                    _ => None,
                },
            ),
        };
        format!("{prefix}{}", mapped.unwrap_or(self.message.as_str()))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_messages_are_mapped() {
        let err = AuthError::new(AuthErrorCode::WrongPassword, "raw");
        assert_eq!(
            err.user_message(AuthFlow::SignIn),
            "Login failed. Incorrect password."
        );

        let err = AuthError::new(AuthErrorCode::UserNotFound, "raw");
        assert_eq!(
            err.user_message(AuthFlow::SignIn),
            "Login failed. No account found with this email."
        );
    }

    #[test]
    fn test_sign_up_messages_are_mapped() {
        let err = AuthError::new(AuthErrorCode::OperationNotAllowed, "raw");
        assert_eq!(
            err.user_message(AuthFlow::SignUp),
            "Signup failed. Email/password accounts are not enabled."
        );
    }

    #[test]
    fn test_unmapped_code_falls_back_to_raw_message() {
        // email-already-in-use has no sign-in mapping
        let err = AuthError::new(AuthErrorCode::EmailAlreadyInUse, "The email is taken");
        assert_eq!(
            err.user_message(AuthFlow::SignIn),
            "Login failed. The email is taken"
        );

        let err = AuthError::new(AuthErrorCode::Other, "network down");
        assert_eq!(err.user_message(AuthFlow::SignUp), "Signup failed. network down");
    }

    #[test]
    fn test_store_errors_become_remote_unavailable() {
        let err: Error = DbErr::Custom("connection reset".to_string()).into();
        assert!(matches!(err, Error::RemoteUnavailable(_)));
        assert!(!err.is_validation());
        assert!(Error::validation("bad").is_validation());
    }
}
