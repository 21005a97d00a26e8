//! Status enums for various entities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an appointment.
///
/// Clients create appointments as `Pending`; staff move them forward from
/// there. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "appointment_status", rename_all = "lowercase")
)]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Stable string form, matching the database enum labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether staff may move an appointment from `self` to `next`.
    ///
    /// Pending appointments can be confirmed or cancelled; confirmed ones
    /// completed or cancelled. Terminal states accept no further changes.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AppointmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an [`AppointmentStatus`] from a string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown appointment status: {0}")]
pub struct ParseStatusError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_forward_or_cancels() {
        let s = AppointmentStatus::Pending;
        assert!(s.can_transition_to(AppointmentStatus::Confirmed));
        assert!(s.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!s.can_transition_to(AppointmentStatus::Completed));
        assert!(!s.can_transition_to(AppointmentStatus::Pending));
    }

    #[test]
    fn terminal_states_are_frozen() {
        for terminal in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            for next in [
                AppointmentStatus::Pending,
                AppointmentStatus::Confirmed,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }
}
