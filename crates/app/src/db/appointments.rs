//! Appointment repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use salon_core::{AppointmentId, AppointmentStatus, UserId};

use super::RepositoryError;
use crate::models::appointment::{Appointment, AppointmentWithClient, BookingRequest};

/// Internal row type for `PostgreSQL` appointment queries.
#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: AppointmentId,
    client_id: UserId,
    service_name: String,
    appointment_date: NaiveDate,
    time_slot: String,
    status: AppointmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            service_name: row.service_name,
            appointment_date: row.appointment_date,
            time_slot: row.time_slot,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type joining an appointment with its client's name.
#[derive(Debug, sqlx::FromRow)]
struct AppointmentWithClientRow {
    #[sqlx(flatten)]
    appointment: AppointmentRow,
    client_name: String,
}

impl From<AppointmentWithClientRow> for AppointmentWithClient {
    fn from(row: AppointmentWithClientRow) -> Self {
        Self {
            appointment: row.appointment.into(),
            client_name: row.client_name,
        }
    }
}

/// Repository for appointment database operations.
pub struct AppointmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppointmentRepository<'a> {
    /// Create a new appointment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List one client's appointments, soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_client(
        &self,
        client: UserId,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            r"
            SELECT id, client_id, service_name, appointment_date, time_slot, status,
                   created_at, updated_at
            FROM appointments
            WHERE client_id = $1
            ORDER BY appointment_date
            ",
        )
        .bind(client)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List all appointments with client names, newest first (staff view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<AppointmentWithClient>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentWithClientRow>(
            r"
            SELECT a.id, a.client_id, a.service_name, a.appointment_date, a.time_slot,
                   a.status, a.created_at, a.updated_at,
                   u.full_name AS client_name
            FROM appointments a
            JOIN users u ON u.id = a.client_id
            ORDER BY a.appointment_date DESC, a.created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The most recent appointments with client names (dashboard).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(
        &self,
        limit: i64,
    ) -> Result<Vec<AppointmentWithClient>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentWithClientRow>(
            r"
            SELECT a.id, a.client_id, a.service_name, a.appointment_date, a.time_slot,
                   a.status, a.created_at, a.updated_at,
                   u.full_name AS client_name
            FROM appointments a
            JOIN users u ON u.id = a.client_id
            ORDER BY a.appointment_date DESC, a.created_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an appointment by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: AppointmentId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r"
            SELECT id, client_id, service_name, appointment_date, time_slot, status,
                   created_at, updated_at
            FROM appointments
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a new pending booking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn book(&self, request: &BookingRequest) -> Result<Appointment, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r"
            INSERT INTO appointments (client_id, service_name, appointment_date, time_slot, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id, client_id, service_name, appointment_date, time_slot, status,
                      created_at, updated_at
            ",
        )
        .bind(request.client_id)
        .bind(&request.service_name)
        .bind(request.appointment_date)
        .bind(&request.time_slot)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Move an appointment to a new status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r"
            UPDATE appointments
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, client_id, service_name, appointment_date, time_slot, status,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Count completed appointments (dashboard metric).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_completed(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM appointments
            WHERE status = 'completed'
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
