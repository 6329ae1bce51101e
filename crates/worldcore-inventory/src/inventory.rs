//! Items, slots, and money held by one character.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use worldcore_protocol::{EntityId, ItemId};

use crate::InventoryError;

// ---------------------------------------------------------------------------
// ItemStorage
// ---------------------------------------------------------------------------

/// The slot and money fields a backup can capture and restore.
///
/// Implemented by anything that holds items in numbered slots: a
/// character inventory, a bank vault, a guild storage.
pub trait ItemStorage {
    /// `(item, slot)` for every item currently held.
    fn item_slots(&self) -> Vec<(ItemId, u16)>;

    fn money(&self) -> u64;

    /// Puts `item` back into `slot`. Returns `false` if the item is no
    /// longer held; the storage is unchanged in that case.
    ///
    /// Restores write recorded values directly, so no occupancy check
    /// is made here.
    fn set_item_slot(&mut self, item: ItemId, slot: u16) -> bool;

    fn set_money(&mut self, money: u64);
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// One item instance.
///
/// The slot is only changed through the owning [`Inventory`]; every other
/// field is free game data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    slot: u16,
    /// Which kind of item this is (sword, potion, ...).
    pub template_id: u32,
    pub level: u8,
    pub durability: u16,
    pub quantity: u16,
}

impl Item {
    pub fn new(id: ItemId, template_id: u32, slot: u16) -> Self {
        Self {
            id,
            slot,
            template_id,
            level: 0,
            durability: 100,
            quantity: 1,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn slot(&self) -> u16 {
        self.slot
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// A character's inventory: `capacity` numbered slots and a money counter.
///
/// At most one item per slot as long as items are placed through
/// [`add_item`](Self::add_item) and [`move_item`](Self::move_item).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    owner: EntityId,
    capacity: u16,
    items: BTreeMap<ItemId, Item>,
    money: u64,
}

impl Inventory {
    pub fn new(owner: EntityId, capacity: u16) -> Self {
        Self {
            owner,
            capacity,
            items: BTreeMap::new(),
            money: 0,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Places `item` in its slot.
    pub fn add_item(&mut self, item: Item) -> Result<(), InventoryError> {
        if self.items.contains_key(&item.id) {
            return Err(InventoryError::DuplicateItem(item.id));
        }
        self.check_slot_free(item.slot)?;
        tracing::debug!(owner = %self.owner, item = %item.id, slot = item.slot, "item added");
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Takes an item out of the inventory.
    pub fn remove_item(&mut self, id: ItemId) -> Result<Item, InventoryError> {
        let item = self
            .items
            .remove(&id)
            .ok_or(InventoryError::ItemNotFound(id))?;
        tracing::debug!(owner = %self.owner, item = %id, "item removed");
        Ok(item)
    }

    /// Moves an item to an empty slot. Moving onto its own slot is a no-op.
    pub fn move_item(&mut self, id: ItemId, slot: u16) -> Result<(), InventoryError> {
        let current = self
            .items
            .get(&id)
            .ok_or(InventoryError::ItemNotFound(id))?
            .slot;
        if current == slot {
            return Ok(());
        }
        self.check_slot_free(slot)?;
        if let Some(item) = self.items.get_mut(&id) {
            item.slot = slot;
        }
        Ok(())
    }

    /// Exchanges the slots of two items.
    pub fn swap_items(&mut self, a: ItemId, b: ItemId) -> Result<(), InventoryError> {
        let slot_a = self.item(a).ok_or(InventoryError::ItemNotFound(a))?.slot;
        let slot_b = self.item(b).ok_or(InventoryError::ItemNotFound(b))?.slot;
        self.set_item_slot(a, slot_b);
        self.set_item_slot(b, slot_a);
        Ok(())
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Mutable access to an item's game data (level, durability, ...).
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    /// The item in `slot`, if any.
    pub fn item_at(&self, slot: u16) -> Option<&Item> {
        self.items.values().find(|item| item.slot == slot)
    }

    /// Lowest empty slot.
    pub fn free_slot(&self) -> Option<u16> {
        (0..self.capacity).find(|&slot| self.item_at(slot).is_none())
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.values()
    }

    pub fn money(&self) -> u64 {
        self.money
    }

    pub fn add_money(&mut self, amount: u64) -> Result<(), InventoryError> {
        self.money = self
            .money
            .checked_add(amount)
            .ok_or(InventoryError::MoneyOverflow {
                current: self.money,
                amount,
            })?;
        Ok(())
    }

    /// Deducts `amount`, or fails without touching the balance.
    pub fn try_remove_money(&mut self, amount: u64) -> Result<(), InventoryError> {
        self.money = self
            .money
            .checked_sub(amount)
            .ok_or(InventoryError::InsufficientMoney {
                required: amount,
                available: self.money,
            })?;
        Ok(())
    }

    fn check_slot_free(&self, slot: u16) -> Result<(), InventoryError> {
        if slot >= self.capacity {
            return Err(InventoryError::InvalidSlot {
                slot,
                capacity: self.capacity,
            });
        }
        match self.item_at(slot) {
            Some(occupant) => Err(InventoryError::SlotOccupied {
                slot,
                occupant: occupant.id,
            }),
            None => Ok(()),
        }
    }
}

impl ItemStorage for Inventory {
    fn item_slots(&self) -> Vec<(ItemId, u16)> {
        self.items.values().map(|item| (item.id, item.slot)).collect()
    }

    fn money(&self) -> u64 {
        self.money
    }

    fn set_item_slot(&mut self, item: ItemId, slot: u16) -> bool {
        match self.items.get_mut(&item) {
            Some(item) => {
                item.slot = slot;
                true
            }
            None => false,
        }
    }

    fn set_money(&mut self, money: u64) {
        self.money = money;
    }
}
