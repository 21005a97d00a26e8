//! Appointment domain types.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use salon_core::{AppointmentId, AppointmentStatus, UserId};

/// The bookable time slots offered by the salon.
pub const TIME_SLOTS: &[&str] = &[
    "09:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "02:00 PM", "03:00 PM", "04:00 PM", "05:00 PM",
];

/// How many days ahead (including today) a client may book.
pub const BOOKING_WINDOW_DAYS: i64 = 7;

/// A client booking.
///
/// The service is recorded by name at booking time, so renaming or deleting
/// a catalog entry later does not rewrite booking history.
#[derive(Debug, Clone)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: UserId,
    pub service_name: String,
    pub appointment_date: NaiveDate,
    pub time_slot: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An appointment joined with the booking client's display name, for staff
/// screens.
#[derive(Debug, Clone)]
pub struct AppointmentWithClient {
    pub appointment: Appointment,
    pub client_name: String,
}

/// The dates currently open for booking: today plus the following days of
/// the booking window.
#[must_use]
pub fn booking_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..BOOKING_WINDOW_DAYS)
        .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
        .collect()
}

/// A validated booking request.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub client_id: UserId,
    pub service_name: String,
    pub appointment_date: NaiveDate,
    pub time_slot: String,
}

/// Errors produced while validating a booking form.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("please select all required fields")]
    MissingField,
    #[error("invalid appointment date")]
    InvalidDate,
    #[error("the selected date is outside the booking window")]
    DateOutsideWindow,
    #[error("unknown time slot")]
    UnknownTimeSlot,
}

impl BookingRequest {
    /// Validate the raw booking form against the current date.
    ///
    /// # Errors
    ///
    /// Returns `BookingError` if a field is missing, the date does not
    /// parse or falls outside the booking window, or the slot is not one
    /// the salon offers.
    pub fn parse(
        client_id: UserId,
        service_name: &str,
        date: &str,
        time_slot: &str,
        today: NaiveDate,
    ) -> Result<Self, BookingError> {
        let service_name = service_name.trim();
        let time_slot = time_slot.trim();
        if service_name.is_empty() || date.trim().is_empty() || time_slot.is_empty() {
            return Err(BookingError::MissingField);
        }

        let appointment_date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| BookingError::InvalidDate)?;
        if !booking_dates(today).contains(&appointment_date) {
            return Err(BookingError::DateOutsideWindow);
        }

        if !TIME_SLOTS.contains(&time_slot) {
            return Err(BookingError::UnknownTimeSlot);
        }

        Ok(Self {
            client_id,
            service_name: service_name.to_owned(),
            appointment_date,
            time_slot: time_slot.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 3).expect("valid date")
    }

    fn client() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    #[test]
    fn booking_window_covers_seven_days() {
        let dates = booking_dates(today());
        assert_eq!(dates.len(), 7);
        assert_eq!(dates.first(), Some(&today()));
        assert_eq!(
            dates.last(),
            Some(&NaiveDate::from_ymd_opt(2026, 8, 9).expect("valid date"))
        );
    }

    #[test]
    fn accepts_a_slot_inside_the_window() {
        let request =
            BookingRequest::parse(client(), "Haircut", "2026-08-05", "02:00 PM", today())
                .expect("valid booking");
        assert_eq!(request.time_slot, "02:00 PM");
    }

    #[test]
    fn rejects_dates_outside_the_window() {
        assert!(matches!(
            BookingRequest::parse(client(), "Haircut", "2026-08-10", "02:00 PM", today()),
            Err(BookingError::DateOutsideWindow)
        ));
        assert!(matches!(
            BookingRequest::parse(client(), "Haircut", "2026-08-02", "02:00 PM", today()),
            Err(BookingError::DateOutsideWindow)
        ));
    }

    #[test]
    fn rejects_unknown_slots_and_blank_fields() {
        assert!(matches!(
            BookingRequest::parse(client(), "Haircut", "2026-08-05", "01:00 PM", today()),
            Err(BookingError::UnknownTimeSlot)
        ));
        assert!(matches!(
            BookingRequest::parse(client(), "", "2026-08-05", "02:00 PM", today()),
            Err(BookingError::MissingField)
        ));
    }
}
