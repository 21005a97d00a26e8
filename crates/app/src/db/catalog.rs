//! Service catalog repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use salon_core::{Price, ServiceId};

use super::RepositoryError;
use crate::models::service::{Service, ServiceInput};

/// Internal row type for `PostgreSQL` service queries.
#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: ServiceId,
    name: String,
    description: String,
    duration_minutes: i32,
    price: Price,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            duration_minutes: row.duration_minutes,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for service catalog database operations.
pub struct ServiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRepository<'a> {
    /// Create a new service repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all services ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Service>, RepositoryError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r"
            SELECT id, name, description, duration_minutes, price, created_at, updated_at
            FROM services
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a service by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ServiceId) -> Result<Option<Service>, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r"
            SELECT id, name, description, duration_minutes, price, created_at, updated_at
            FROM services
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Look up a service by its exact name (used when pricing a completed
    /// appointment).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Service>, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r"
            SELECT id, name, description, duration_minutes, price, created_at, updated_at
            FROM services
            WHERE name = $1
            ",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: &ServiceInput) -> Result<Service, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r"
            INSERT INTO services (name, description, duration_minutes, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, duration_minutes, price, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.duration_minutes)
        .bind(input.price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update an existing service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ServiceId,
        input: &ServiceInput,
    ) -> Result<Service, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r"
            UPDATE services
            SET name = $2, description = $3, duration_minutes = $4, price = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, duration_minutes, price, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.duration_minutes)
        .bind(input.price)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ServiceId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM services
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
