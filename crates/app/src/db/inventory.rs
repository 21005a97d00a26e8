//! Inventory repository, including transactional usage recording.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use salon_core::{InventoryItemId, Price};

use super::RepositoryError;
use crate::models::inventory::{InventoryItem, InventoryItemInput, UsageLine};

/// Internal row type for `PostgreSQL` inventory queries.
#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: InventoryItemId,
    item_name: String,
    quantity: i32,
    unit_price: Price,
    reorder_level: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InventoryRow> for InventoryItem {
    fn from(row: InventoryRow) -> Self {
        Self {
            id: row.id,
            item_name: row.item_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            reorder_level: row.reorder_level,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for inventory database operations.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    /// Create a new inventory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all inventory items ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r"
            SELECT id, item_name, quantity, unit_price, reorder_level, created_at, updated_at
            FROM inventory
            ORDER BY item_name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an inventory item by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: InventoryItemId,
    ) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r"
            SELECT id, item_name, quantity, unit_price, reorder_level, created_at, updated_at
            FROM inventory
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new inventory item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        input: &InventoryItemInput,
    ) -> Result<InventoryItem, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r"
            INSERT INTO inventory (item_name, quantity, unit_price, reorder_level)
            VALUES ($1, $2, $3, $4)
            RETURNING id, item_name, quantity, unit_price, reorder_level, created_at, updated_at
            ",
        )
        .bind(&input.item_name)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(input.reorder_level)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update an existing inventory item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: InventoryItemId,
        input: &InventoryItemInput,
    ) -> Result<InventoryItem, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r"
            UPDATE inventory
            SET item_name = $2, quantity = $3, unit_price = $4, reorder_level = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING id, item_name, quantity, unit_price, reorder_level, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.item_name)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(input.reorder_level)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete an inventory item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the id does not exist, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: InventoryItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM inventory
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

    /// Apply a set of usage deductions in one transaction.
    ///
    /// Each row is guarded with `quantity >= used`, so if stock changed
    /// between planning and recording (another terminal recording usage at
    /// the same time), the whole transaction rolls back instead of driving
    /// a quantity negative.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any line no longer has enough
    /// stock, or `RepositoryError::Database` if a query fails.
    pub async fn record_usage(&self, lines: &[UsageLine]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for line in lines {
            let result = sqlx::query(
                r"
                UPDATE inventory
                SET quantity = quantity - $2, updated_at = now()
                WHERE id = $1 AND quantity >= $2
                ",
            )
            .bind(line.item)
            .bind(line.used)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(RepositoryError::Conflict(format!(
                    "not enough stock for item {}",
                    line.item
                )));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Count items at or below their reorder level (dashboard metric).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_low_stock(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM inventory
            WHERE quantity <= reorder_level
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
