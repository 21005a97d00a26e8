//! Inventory domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use salon_core::{InventoryItemId, Price};

/// A stocked item consumed by salon services.
#[derive(Debug, Clone)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub item_name: String,
    /// Units currently in stock. Never negative.
    pub quantity: i32,
    pub unit_price: Price,
    /// Stock level at or below which the item counts as "low stock".
    pub reorder_level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Whether the item is at or below its reorder level.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// Validated input for creating or updating an inventory item.
#[derive(Debug, Clone)]
pub struct InventoryItemInput {
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: Price,
    pub reorder_level: i32,
}

/// Errors produced while validating an inventory form.
#[derive(Debug, thiserror::Error)]
pub enum InventoryInputError {
    #[error("please fill in all fields")]
    MissingField,
    #[error("quantity must be a non-negative whole number")]
    InvalidQuantity,
    #[error("unit price must be a non-negative amount")]
    InvalidUnitPrice,
    #[error("reorder level must be a non-negative whole number")]
    InvalidReorderLevel,
}

impl InventoryItemInput {
    /// Validate raw form fields.
    ///
    /// # Errors
    ///
    /// Returns `InventoryInputError` if any field is empty or fails numeric
    /// parsing.
    pub fn parse(
        item_name: &str,
        quantity: &str,
        unit_price: &str,
        reorder_level: &str,
    ) -> Result<Self, InventoryInputError> {
        let item_name = item_name.trim();
        if item_name.is_empty()
            || quantity.trim().is_empty()
            || unit_price.trim().is_empty()
            || reorder_level.trim().is_empty()
        {
            return Err(InventoryInputError::MissingField);
        }

        let quantity: i32 = quantity
            .trim()
            .parse()
            .map_err(|_| InventoryInputError::InvalidQuantity)?;
        if quantity < 0 {
            return Err(InventoryInputError::InvalidQuantity);
        }

        let amount: Decimal = unit_price
            .trim()
            .parse()
            .map_err(|_| InventoryInputError::InvalidUnitPrice)?;
        if amount < Decimal::ZERO {
            return Err(InventoryInputError::InvalidUnitPrice);
        }

        let reorder_level: i32 = reorder_level
            .trim()
            .parse()
            .map_err(|_| InventoryInputError::InvalidReorderLevel)?;
        if reorder_level < 0 {
            return Err(InventoryInputError::InvalidReorderLevel);
        }

        Ok(Self {
            item_name: item_name.to_owned(),
            quantity,
            unit_price: Price::new(amount),
            reorder_level,
        })
    }
}

/// One line of a usage recording: how many units of an item were consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageLine {
    pub item: InventoryItemId,
    pub used: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_form() {
        let input = InventoryItemInput::parse("Shampoo", "24", "8.50", "5").expect("valid");
        assert_eq!(input.quantity, 24);
        assert_eq!(input.reorder_level, 5);
        assert_eq!(input.unit_price.display(), "$8.50");
    }

    #[test]
    fn rejects_negative_numbers() {
        assert!(InventoryItemInput::parse("Shampoo", "-1", "8.50", "5").is_err());
        assert!(InventoryItemInput::parse("Shampoo", "24", "-8.50", "5").is_err());
        assert!(InventoryItemInput::parse("Shampoo", "24", "8.50", "-5").is_err());
    }

    #[test]
    fn low_stock_is_at_or_below_reorder_level() {
        let mut item = InventoryItem {
            id: InventoryItemId::new(1),
            item_name: "Conditioner".into(),
            quantity: 5,
            unit_price: Price::ZERO,
            reorder_level: 5,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert!(item.is_low_stock());
        item.quantity = 6;
        assert!(!item.is_low_stock());
    }
}
