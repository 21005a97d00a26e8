//! Session-related types.
//!
//! Types stored in the cookie session for authentication state.

use serde::{Deserialize, Serialize};

use salon_core::{Email, UserId};

/// Session-stored identity.
///
/// Minimal data identifying the signed-in user. The access role is
/// deliberately NOT stored here: it is resolved fresh from the profile row
/// on every gating decision, so a role change (or a deleted profile) takes
/// effect without waiting for the session to expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// The user's subject identifier.
    pub id: UserId,
    /// The user's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";
}
