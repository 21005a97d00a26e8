//! Staff account management commands.
//!
//! # Usage
//!
//! ```bash
//! salon-cli admin create -e admin@smartsalon.com -n "Admin User" -p 'a strong password'
//! ```
//!
//! # Environment Variables
//!
//! - `SALON_DATABASE_URL` - `PostgreSQL` connection string

use sqlx::PgPool;
use uuid::Uuid;

use salon_core::{Email, UserId};

use salon_app::db::{RepositoryError, UserRepository};
use salon_app::services::auth::{hash_password, validate_password};

/// Errors that can occur during staff account operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password does not meet requirements.
    #[error("Weak password: {0}")]
    WeakPassword(String),

    /// Password hashing failed.
    #[error("Password hashing failed")]
    PasswordHash,

    /// User already exists.
    #[error("An account already exists with email: {0}")]
    UserExists(String),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Create a new staff account.
///
/// # Arguments
///
/// * `email` - Staff email address
/// * `name` - Staff display name
/// * `password` - Initial password (min 8 characters)
///
/// # Returns
///
/// The id of the created profile.
///
/// # Errors
///
/// Returns `AdminError` on validation failure, duplicate email, or
/// database errors.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();

    // Parse and validate inputs before touching the database
    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;
    validate_password(password).map_err(|e| AdminError::WeakPassword(e.to_string()))?;
    let password_hash = hash_password(password).map_err(|_| AdminError::PasswordHash)?;

    let database_url = std::env::var("SALON_DATABASE_URL")
        .map_err(|_| AdminError::MissingEnvVar("SALON_DATABASE_URL"))?;

    tracing::info!("Connecting to salon database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating staff account: {} ({})", email, name);

    let repo = UserRepository::new(&pool);
    let user = repo
        .create_staff(UserId::new(Uuid::new_v4()), &email, name, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Staff account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}
