//! Usage planning for inventory deductions.
//!
//! Staff record how many units of each item a day of appointments consumed.
//! The planner validates the request against the stock levels just read;
//! the repository then re-checks each row inside the recording transaction,
//! so the plan is a user-facing validation step, not the integrity
//! guarantee.

use std::collections::HashMap;

use salon_core::InventoryItemId;

use crate::models::inventory::{InventoryItem, UsageLine};

/// Errors produced while planning a usage recording.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsageError {
    /// No line had a positive quantity.
    #[error("please enter usage quantity for at least one item")]
    NothingToRecord,

    /// A quantity field did not parse as a non-negative whole number.
    #[error("invalid quantity for {item_name}")]
    InvalidQuantity { item_name: String },

    /// A requested item is not in the inventory list.
    #[error("unknown inventory item")]
    UnknownItem,

    /// A line asks for more units than are in stock.
    #[error("not enough {item_name} in stock")]
    InsufficientStock { item_name: String },
}

/// Validate raw usage form fields against current stock.
///
/// `requested` maps item ids to the raw quantity strings from the form.
/// Blank fields and zero lines are skipped; every remaining line must name
/// a known item and fit within its current quantity.
///
/// # Errors
///
/// Returns `UsageError` describing the first violated rule.
pub fn plan_usage(
    items: &[InventoryItem],
    requested: &HashMap<InventoryItemId, String>,
) -> Result<Vec<UsageLine>, UsageError> {
    let by_id: HashMap<InventoryItemId, &InventoryItem> =
        items.iter().map(|item| (item.id, item)).collect();

    let mut lines = Vec::new();

    for (&id, raw) in requested {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let item = by_id.get(&id).copied().ok_or(UsageError::UnknownItem)?;

        let used: i32 = raw.parse().map_err(|_| UsageError::InvalidQuantity {
            item_name: item.item_name.clone(),
        })?;
        if used < 0 {
            return Err(UsageError::InvalidQuantity {
                item_name: item.item_name.clone(),
            });
        }
        if used == 0 {
            continue;
        }

        if used > item.quantity {
            return Err(UsageError::InsufficientStock {
                item_name: item.item_name.clone(),
            });
        }

        lines.push(UsageLine { item: id, used });
    }

    if lines.is_empty() {
        return Err(UsageError::NothingToRecord);
    }

    // Deterministic order keeps the recording transaction's lock order
    // stable across concurrent submissions.
    lines.sort_by_key(|line| line.item.as_i32());

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use salon_core::Price;

    use super::*;

    fn item(id: i32, name: &str, quantity: i32) -> InventoryItem {
        InventoryItem {
            id: InventoryItemId::new(id),
            item_name: name.to_owned(),
            quantity,
            unit_price: Price::ZERO,
            reorder_level: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(entries: &[(i32, &str)]) -> HashMap<InventoryItemId, String> {
        entries
            .iter()
            .map(|&(id, raw)| (InventoryItemId::new(id), raw.to_owned()))
            .collect()
    }

    #[test]
    fn plans_positive_lines_and_skips_zeroes() {
        let items = [item(1, "Shampoo", 10), item(2, "Conditioner", 4)];
        let lines =
            plan_usage(&items, &request(&[(1, "3"), (2, "0")])).expect("plan succeeds");
        assert_eq!(lines, vec![UsageLine {
            item: InventoryItemId::new(1),
            used: 3,
        }]);
    }

    #[test]
    fn rejects_a_line_exceeding_stock() {
        let items = [item(1, "Shampoo", 2)];
        assert_eq!(
            plan_usage(&items, &request(&[(1, "3")])),
            Err(UsageError::InsufficientStock {
                item_name: "Shampoo".to_owned()
            })
        );
    }

    #[test]
    fn rejects_an_all_zero_submission() {
        let items = [item(1, "Shampoo", 2)];
        assert_eq!(
            plan_usage(&items, &request(&[(1, "0"), (1, "")])),
            Err(UsageError::NothingToRecord)
        );
    }

    #[test]
    fn rejects_unknown_items_and_garbage_quantities() {
        let items = [item(1, "Shampoo", 2)];
        assert_eq!(
            plan_usage(&items, &request(&[(9, "1")])),
            Err(UsageError::UnknownItem)
        );
        assert!(matches!(
            plan_usage(&items, &request(&[(1, "lots")])),
            Err(UsageError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            plan_usage(&items, &request(&[(1, "-2")])),
            Err(UsageError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn lines_come_out_in_item_order() {
        let items = [item(5, "Wax", 9), item(2, "Gel", 9), item(8, "Oil", 9)];
        let lines = plan_usage(&items, &request(&[(8, "1"), (2, "1"), (5, "1")]))
            .expect("plan succeeds");
        let order: Vec<i32> = lines.iter().map(|l| l.item.as_i32()).collect();
        assert_eq!(order, vec![2, 5, 8]);
    }
}
