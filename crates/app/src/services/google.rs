//! Google ID-token verification for client sign-in.
//!
//! The device runs the interactive Google flow and posts the resulting ID
//! token; the server confirms it with Google's tokeninfo endpoint and checks
//! the audience against the configured OAuth client ID before trusting any
//! claim in it.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use salon_core::UserId;

/// Google's token introspection endpoint.
const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Errors that can occur while verifying a Google ID token.
#[derive(Debug, Error)]
pub enum GoogleVerifyError {
    /// The HTTP call to Google failed.
    #[error("tokeninfo request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Google rejected the token.
    #[error("token rejected by google (status {0})")]
    Rejected(u16),

    /// The token was issued for a different OAuth client.
    #[error("token audience mismatch")]
    AudienceMismatch,

    /// The token's email is not verified with Google.
    #[error("google account email is not verified")]
    UnverifiedEmail,
}

/// Claims returned by the tokeninfo endpoint.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: String,
    /// Google serializes this boolean as a string.
    #[serde(default)]
    email_verified: String,
    #[serde(default)]
    name: String,
}

/// A verified Google identity.
#[derive(Debug, Clone)]
pub struct VerifiedGoogleToken {
    /// Google's stable subject identifier for the account.
    pub sub: String,
    pub email: String,
    pub name: String,
}

impl VerifiedGoogleToken {
    /// The profile id this Google account maps to.
    ///
    /// Derived deterministically from the Google subject so that every
    /// sign-in by the same account lands on the same profile row.
    #[must_use]
    pub fn subject_id(&self) -> UserId {
        let name = format!("google:{}", self.sub);
        UserId::new(Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()))
    }
}

/// Verifies Google ID tokens against a configured OAuth client ID.
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: String,
}

impl GoogleVerifier {
    /// Create a verifier for the given OAuth client ID.
    #[must_use]
    pub fn new(client_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
        }
    }

    /// Verify an ID token and return its trusted claims.
    ///
    /// # Errors
    ///
    /// Returns `GoogleVerifyError` if the call fails, Google rejects the
    /// token, the audience does not match, or the account email is
    /// unverified.
    pub async fn verify_id_token(
        &self,
        id_token: &str,
    ) -> Result<VerifiedGoogleToken, GoogleVerifyError> {
        let response = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GoogleVerifyError::Rejected(response.status().as_u16()));
        }

        let info: TokenInfo = response.json().await?;

        if info.aud != self.client_id {
            return Err(GoogleVerifyError::AudienceMismatch);
        }

        if info.email_verified != "true" {
            return Err(GoogleVerifyError::UnverifiedEmail);
        }

        Ok(VerifiedGoogleToken {
            sub: info.sub,
            email: info.email,
            name: info.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_id_is_stable_per_google_account() {
        let token = VerifiedGoogleToken {
            sub: "108177555555".to_owned(),
            email: "client@example.com".to_owned(),
            name: "A Client".to_owned(),
        };
        assert_eq!(token.subject_id(), token.subject_id());

        let other = VerifiedGoogleToken {
            sub: "108177555556".to_owned(),
            ..token.clone()
        };
        assert_ne!(token.subject_id(), other.subject_id());
    }
}
