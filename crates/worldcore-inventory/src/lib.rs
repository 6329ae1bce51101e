//! Inventory state and transactional rollback.
//!
//! - [`Inventory`]: items in numbered slots plus money
//! - [`ItemStorage`]: the slot/money surface a backup works against
//! - [`BackupItemStorage`]: immutable snapshot with restore
//! - [`InventoryTransaction`]: rolls back on drop unless committed

mod backup;
mod error;
mod inventory;

pub use backup::{BackupItemStorage, InventoryTransaction};
pub use error::InventoryError;
pub use inventory::{Inventory, Item, ItemStorage};
