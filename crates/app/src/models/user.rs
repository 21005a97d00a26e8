//! User profile domain types.

use chrono::{DateTime, Utc};

use salon_core::{Email, Role, UserId};

/// A user profile (domain type).
///
/// Staff accounts are provisioned through the CLI and sign in with a
/// password; client profiles are created (or refreshed) by Google sign-in.
#[derive(Debug, Clone)]
pub struct User {
    /// Subject identifier issued at account creation.
    pub id: UserId,
    /// The user's email address.
    pub email: Email,
    /// Display name.
    pub full_name: String,
    /// Contact phone number (clients only).
    pub phone_number: Option<String>,
    /// Access role: which section this user may reach.
    pub role: Role,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Profile fields written by a Google client sign-in.
///
/// The row is keyed by the subject id, so a returning client's name and
/// phone number are refreshed in place.
#[derive(Debug, Clone)]
pub struct ClientProfile {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone_number: String,
}
