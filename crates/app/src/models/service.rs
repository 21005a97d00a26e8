//! Service catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use salon_core::{Price, ServiceId};

/// A bookable salon service.
#[derive(Debug, Clone)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
    /// How long an appointment for this service takes.
    pub duration_minutes: i32,
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating or updating a service.
#[derive(Debug, Clone)]
pub struct ServiceInput {
    pub name: String,
    pub description: String,
    pub duration_minutes: i32,
    pub price: Price,
}

/// Errors produced while validating a service form.
#[derive(Debug, thiserror::Error)]
pub enum ServiceInputError {
    #[error("please fill in all fields")]
    MissingField,
    #[error("duration must be a positive number of minutes")]
    InvalidDuration,
    #[error("price must be a non-negative amount")]
    InvalidPrice,
}

impl ServiceInput {
    /// Validate raw form fields.
    ///
    /// # Errors
    ///
    /// Returns `ServiceInputError` if any field is empty or fails numeric
    /// parsing.
    pub fn parse(
        name: &str,
        description: &str,
        duration: &str,
        price: &str,
    ) -> Result<Self, ServiceInputError> {
        let name = name.trim();
        let description = description.trim();
        if name.is_empty() || description.is_empty() || duration.trim().is_empty()
            || price.trim().is_empty()
        {
            return Err(ServiceInputError::MissingField);
        }

        let duration_minutes: i32 = duration
            .trim()
            .parse()
            .map_err(|_| ServiceInputError::InvalidDuration)?;
        if duration_minutes <= 0 {
            return Err(ServiceInputError::InvalidDuration);
        }

        let amount: Decimal = price
            .trim()
            .parse()
            .map_err(|_| ServiceInputError::InvalidPrice)?;
        if amount < Decimal::ZERO {
            return Err(ServiceInputError::InvalidPrice);
        }

        Ok(Self {
            name: name.to_owned(),
            description: description.to_owned(),
            duration_minutes,
            price: Price::new(amount),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_form() {
        let input = ServiceInput::parse("Haircut", "Classic cut", "30", "29.99").expect("valid");
        assert_eq!(input.duration_minutes, 30);
        assert_eq!(input.price.display(), "$29.99");
    }

    #[test]
    fn rejects_blank_fields() {
        assert!(matches!(
            ServiceInput::parse("", "desc", "30", "29.99"),
            Err(ServiceInputError::MissingField)
        ));
        assert!(matches!(
            ServiceInput::parse("Haircut", "desc", "  ", "29.99"),
            Err(ServiceInputError::MissingField)
        ));
    }

    #[test]
    fn rejects_non_positive_duration() {
        assert!(matches!(
            ServiceInput::parse("Haircut", "desc", "0", "29.99"),
            Err(ServiceInputError::InvalidDuration)
        ));
        assert!(matches!(
            ServiceInput::parse("Haircut", "desc", "abc", "29.99"),
            Err(ServiceInputError::InvalidDuration)
        ));
    }

    #[test]
    fn rejects_negative_price() {
        assert!(matches!(
            ServiceInput::parse("Haircut", "desc", "30", "-1"),
            Err(ServiceInputError::InvalidPrice)
        ));
    }
}
