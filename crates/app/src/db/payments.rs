//! Payment repository.
//!
//! Payments are bookkeeping rows recorded when staff mark an appointment
//! completed; the dashboard sums them for the revenue metric. There is no
//! payment-gateway integration.

use sqlx::PgPool;

use salon_core::{AppointmentId, Price};

use super::RepositoryError;

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a payment for a completed appointment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record(
        &self,
        appointment: AppointmentId,
        amount: Price,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO payments (appointment_id, amount)
            VALUES ($1, $2)
            ",
        )
        .bind(appointment)
        .bind(amount)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Total revenue across all payments (dashboard metric).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn total_revenue(&self) -> Result<Price, RepositoryError> {
        let total = sqlx::query_scalar::<_, Option<Price>>(
            r"
            SELECT SUM(amount)
            FROM payments
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(total.unwrap_or(Price::ZERO))
    }
}
