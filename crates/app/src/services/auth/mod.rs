//! Authentication service.
//!
//! Two sign-in paths, matching the two kinds of accounts:
//! - staff sign in with email + password (argon2 verification against the
//!   hash stored on their provisioned profile)
//! - clients sign in with a Google ID token plus a phone number; their
//!   profile row is created or refreshed on every sign-in

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use salon_core::Email;

use crate::db::users::UserRepository;
use crate::models::user::{ClientProfile, User};
use crate::services::google::{GoogleVerifier, VerifiedGoogleToken};

/// Minimum password length for staff accounts.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    google: Option<&'a GoogleVerifier>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, google: Option<&'a GoogleVerifier>) -> Self {
        Self {
            users: UserRepository::new(pool),
            google,
        }
    }

    // =========================================================================
    // Staff Password Authentication
    // =========================================================================

    /// Sign a staff member in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is
    /// wrong, the account does not exist, or the account has no password.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        // Validate email format
        let email = Email::parse(email)?;

        // Get user with password hash
        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Verify password
        verify_password(password, &password_hash)?;

        Ok(user)
    }

    // =========================================================================
    // Client Google Sign-In
    // =========================================================================

    /// Sign a client in with a Google ID token, creating or refreshing
    /// their profile row.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::GoogleSignInDisabled` if no Google client ID is
    /// configured, `AuthError::MissingPhoneNumber` if the phone field is
    /// blank, `AuthError::InvalidGoogleToken` if verification fails, and
    /// `AuthError::Repository` on storage errors.
    pub async fn login_with_google(
        &self,
        id_token: &str,
        phone_number: &str,
    ) -> Result<User, AuthError> {
        let verifier = self.google.ok_or(AuthError::GoogleSignInDisabled)?;

        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(AuthError::MissingPhoneNumber);
        }

        let token = verifier
            .verify_id_token(id_token)
            .await
            .map_err(|e| AuthError::InvalidGoogleToken(e.to_string()))?;

        let profile = client_profile_from_token(&token, phone_number)?;
        let user = self.users.upsert_client(&profile).await?;

        Ok(user)
    }
}

/// Build the profile row a verified Google token maps to.
fn client_profile_from_token(
    token: &VerifiedGoogleToken,
    phone_number: &str,
) -> Result<ClientProfile, AuthError> {
    let email = Email::parse(&token.email)?;
    let full_name = if token.name.trim().is_empty() {
        email.as_str().to_owned()
    } else {
        token.name.trim().to_owned()
    };

    Ok(ClientProfile {
        id: token.subject_id(),
        email,
        full_name,
        phone_number: phone_number.to_owned(),
    })
}

/// Validate password strength for new staff accounts.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery").expect("hashes");
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough password").is_ok());
    }
}
