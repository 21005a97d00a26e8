//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] salon_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Google sign-in requires a phone number for the salon to reach the
    /// client.
    #[error("phone number is required")]
    MissingPhoneNumber,

    /// The presented Google ID token did not verify.
    #[error("google token rejected: {0}")]
    InvalidGoogleToken(String),

    /// Google sign-in is not configured on this deployment.
    #[error("google sign-in is not configured")]
    GoogleSignInDisabled,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
