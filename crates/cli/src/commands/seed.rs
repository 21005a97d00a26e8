//! Seed the database with starter data.
//!
//! Inserts a small service catalog and inventory so a fresh deployment has
//! something to book against. Skips any table that already has rows, so
//! running it twice is harmless.
//!
//! # Usage
//!
//! ```bash
//! salon-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `SALON_DATABASE_URL` - `PostgreSQL` connection string

use sqlx::PgPool;

/// Starter services: name, description, duration minutes, price.
const SERVICES: &[(&str, &str, i32, &str)] = &[
    ("Haircut", "Classic cut and style", 30, "29.99"),
    ("Hair Coloring", "Full color treatment", 90, "89.99"),
    ("Manicure", "Shape, buff and polish", 45, "24.99"),
    ("Facial", "Deep cleansing facial", 60, "49.99"),
];

/// Starter inventory: name, quantity, unit price, reorder level.
const INVENTORY: &[(&str, i32, &str, i32)] = &[
    ("Shampoo", 24, "8.50", 6),
    ("Conditioner", 24, "9.00", 6),
    ("Hair Color - Black", 12, "14.25", 4),
    ("Nail Polish", 30, "5.75", 10),
];

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Seed services and inventory.
///
/// # Errors
///
/// Returns `SeedError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SALON_DATABASE_URL")
        .map_err(|_| SeedError::MissingEnvVar("SALON_DATABASE_URL"))?;

    tracing::info!("Connecting to salon database...");
    let pool = PgPool::connect(&database_url).await?;

    seed_services(&pool).await?;
    seed_inventory(&pool).await?;

    tracing::info!("Seed complete!");
    Ok(())
}

async fn seed_services(pool: &PgPool) -> Result<(), SeedError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::info!("Services table already has {existing} rows; skipping");
        return Ok(());
    }

    for &(name, description, duration, price) in SERVICES {
        sqlx::query(
            r"
            INSERT INTO services (name, description, duration_minutes, price)
            VALUES ($1, $2, $3, $4::numeric)
            ",
        )
        .bind(name)
        .bind(description)
        .bind(duration)
        .bind(price)
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded {} services", SERVICES.len());
    Ok(())
}

async fn seed_inventory(pool: &PgPool) -> Result<(), SeedError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inventory")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::info!("Inventory table already has {existing} rows; skipping");
        return Ok(());
    }

    for &(name, quantity, unit_price, reorder_level) in INVENTORY {
        sqlx::query(
            r"
            INSERT INTO inventory (item_name, quantity, unit_price, reorder_level)
            VALUES ($1, $2, $3::numeric, $4)
            ",
        )
        .bind(name)
        .bind(quantity)
        .bind(unit_price)
        .bind(reorder_level)
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded {} inventory items", INVENTORY.len());
    Ok(())
}
