//! Point-in-time snapshots of item slots and money, for rollback.
//!
//! A trade or crafting step mutates an inventory in several stages; if it
//! is cancelled halfway, the snapshot taken before the first stage puts
//! every item back where it was.
//!
//! Only slots and money are captured. Restoring repositions items that
//! still exist; it never re-creates destroyed items and never undoes
//! changes to other item fields (level, durability, ...).

use std::ops::{Deref, DerefMut};

use worldcore_protocol::ItemId;

use crate::ItemStorage;

// ---------------------------------------------------------------------------
// BackupItemStorage
// ---------------------------------------------------------------------------

/// Immutable `(item, slot)` pairs and a money amount, captured by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupItemStorage {
    items: Vec<(ItemId, u16)>,
    money: u64,
}

impl BackupItemStorage {
    /// Snapshots `storage` as it is right now.
    pub fn new<S: ItemStorage + ?Sized>(storage: &S) -> Self {
        Self {
            items: storage.item_slots(),
            money: storage.money(),
        }
    }

    /// Puts every recorded item back into its recorded slot.
    ///
    /// Items no longer in `storage` are skipped. Returns how many items
    /// were repositioned. Calling it again yields the same slots.
    pub fn restore_item_states<S: ItemStorage + ?Sized>(&self, storage: &mut S) -> usize {
        let mut restored = 0;
        for &(item, slot) in &self.items {
            if storage.set_item_slot(item, slot) {
                restored += 1;
            } else {
                tracing::trace!(%item, slot, "skipping restore of item no longer held");
            }
        }
        tracing::debug!(restored, recorded = self.items.len(), "item slots restored");
        restored
    }

    /// Restores item slots and the money amount.
    pub fn restore<S: ItemStorage + ?Sized>(&self, storage: &mut S) -> usize {
        let restored = self.restore_item_states(storage);
        storage.set_money(self.money);
        restored
    }

    /// The recorded `(item, slot)` pairs.
    pub fn items(&self) -> &[(ItemId, u16)] {
        &self.items
    }

    /// The recorded money amount.
    pub fn money(&self) -> u64 {
        self.money
    }
}

// ---------------------------------------------------------------------------
// InventoryTransaction
// ---------------------------------------------------------------------------

/// Scoped mutation of an [`ItemStorage`] that rolls back unless committed.
///
/// ```
/// # use worldcore_inventory::{Inventory, InventoryTransaction};
/// # use worldcore_protocol::EntityId;
/// let mut inv = Inventory::new(EntityId(1), 8);
/// inv.add_money(100).unwrap();
/// {
///     let mut tx = InventoryTransaction::begin(&mut inv);
///     tx.try_remove_money(30).unwrap();
///     // dropped without commit: rolled back
/// }
/// assert_eq!(inv.money(), 100);
/// ```
pub struct InventoryTransaction<'a, S: ItemStorage> {
    storage: &'a mut S,
    backup: BackupItemStorage,
    committed: bool,
}

impl<'a, S: ItemStorage> InventoryTransaction<'a, S> {
    /// Snapshots `storage` and starts mutating it.
    pub fn begin(storage: &'a mut S) -> Self {
        let backup = BackupItemStorage::new(&*storage);
        Self {
            storage,
            backup,
            committed: false,
        }
    }

    /// The snapshot taken at [`begin`](Self::begin).
    pub fn backup(&self) -> &BackupItemStorage {
        &self.backup
    }

    /// Keeps every change made through the transaction.
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Restores slots and money now instead of on drop.
    pub fn rollback(self) {
        // Drop performs the restore.
    }
}

impl<S: ItemStorage> Deref for InventoryTransaction<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.storage
    }
}

impl<S: ItemStorage> DerefMut for InventoryTransaction<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.storage
    }
}

impl<S: ItemStorage> Drop for InventoryTransaction<'_, S> {
    fn drop(&mut self) {
        if !self.committed {
            let restored = self.backup.restore(&mut *self.storage);
            tracing::info!(restored, "inventory transaction rolled back");
        }
    }
}
