//! Error types for inventory mutations.

use worldcore_protocol::ItemId;

/// Errors that can occur while mutating an [`Inventory`](crate::Inventory).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// No item with this id is in the inventory.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// An item with this id is already in the inventory.
    #[error("item {0} is already in the inventory")]
    DuplicateItem(ItemId),

    /// The target slot is outside `[0, capacity)`.
    #[error("slot {slot} is out of range (capacity {capacity})")]
    InvalidSlot { slot: u16, capacity: u16 },

    /// The target slot already holds another item.
    #[error("slot {slot} is occupied by {occupant}")]
    SlotOccupied { slot: u16, occupant: ItemId },

    /// Not enough money for the deduction.
    #[error("insufficient money: required {required}, available {available}")]
    InsufficientMoney { required: u64, available: u64 },

    /// Adding the amount would overflow the money counter.
    #[error("money overflow: {current} + {amount}")]
    MoneyOverflow { current: u64, amount: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            InventoryError::SlotOccupied {
                slot: 3,
                occupant: ItemId(7)
            }
            .to_string(),
            "slot 3 is occupied by I-7"
        );
        assert_eq!(
            InventoryError::InsufficientMoney {
                required: 50,
                available: 20
            }
            .to_string(),
            "insufficient money: required 50, available 20"
        );
    }
}
