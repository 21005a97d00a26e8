//! User profile repository.
//!
//! Queries use the runtime-checked sqlx API with internal row types
//! converted into domain models.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use salon_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::user::{ClientProfile, User};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    full_name: String,
    phone_number: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            full_name: row.full_name,
            phone_number: row.phone_number,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user profile database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their subject id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, full_name, phone_number, role, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, full_name, phone_number, role, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Read the access role stored on a profile row.
    ///
    /// This is the single profile read behind every gating decision.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no profile row exists for the
    /// id, or `RepositoryError::Database` if the query fails.
    pub async fn role_of(&self, id: UserId) -> Result<Role, RepositoryError> {
        let role = sqlx::query_scalar::<_, Role>(
            r"
            SELECT role
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        role.ok_or(RepositoryError::NotFound)
    }

    /// Get a user together with their password hash (staff sign-in).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct HashRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: Option<String>,
        }

        let row = sqlx::query_as::<_, HashRow>(
            r"
            SELECT id, email, full_name, phone_number, role, created_at, updated_at,
                   password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => {
                let Some(hash) = r.password_hash else {
                    // Accounts without a password (Google clients) cannot
                    // sign in through the staff form.
                    return Ok(None);
                };
                Ok(Some((r.user.try_into()?, hash)))
            }
            None => Ok(None),
        }
    }

    /// Create a staff profile with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_staff(
        &self,
        id: UserId,
        email: &Email,
        full_name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (id, email, full_name, role, password_hash)
            VALUES ($1, $2, $3, 'admin', $4)
            RETURNING id, email, full_name, phone_number, role, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(email.as_str())
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let unique = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
            if unique {
                RepositoryError::Conflict(format!("email already registered: {email}"))
            } else {
                RepositoryError::Database(e)
            }
        })?;

        row.try_into()
    }

    /// Insert or refresh a client profile (Google sign-in).
    ///
    /// The role is pinned to `client`; a sign-in can never escalate an
    /// existing row to staff.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn upsert_client(&self, profile: &ClientProfile) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (id, email, full_name, phone_number, role)
            VALUES ($1, $2, $3, $4, 'client')
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                phone_number = EXCLUDED.phone_number,
                updated_at = now()
            RETURNING id, email, full_name, phone_number, role, created_at, updated_at
            ",
        )
        .bind(profile.id)
        .bind(profile.email.as_str())
        .bind(&profile.full_name)
        .bind(&profile.phone_number)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Count users holding the client role (dashboard metric).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_clients(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM users
            WHERE role = 'client'
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
