//! Access roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Access class governing which application section a user may reach.
///
/// Stored on the user's profile row and read by the role resolver after a
/// session is established. There is deliberately no default: a profile with
/// no resolvable role grants access to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "salon_role", rename_all = "lowercase")
)]
pub enum Role {
    /// Salon staff: dashboard, services, inventory, appointment management.
    Admin,
    /// Salon customer: booking and viewing their own appointments.
    Client,
}

impl Role {
    /// Stable string form, matching the database enum labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "client" => Ok(Self::Client),
            other => Err(ParseRoleError(other.to_owned())),
        }
    }
}

/// Error returned when parsing a [`Role`] from a string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0} (expected admin or client)")]
pub struct ParseRoleError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for role in [Role::Admin, Role::Client] {
            assert_eq!(role.as_str().parse::<Role>().expect("parses"), role);
        }
    }

    #[test]
    fn rejects_unknown_labels() {
        assert!("manager".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }
}
