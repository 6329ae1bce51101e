//! Core value types shared by every worldcore layer.
//!
//! Everything here is plain data: identity newtypes, map coordinates, and
//! the view updates that get pushed to observers. None of it knows about
//! locks, buckets, or pools.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for anything that can be placed on a map
/// (players, monsters, NPCs, dropped items).
///
/// Newtype wrapper so an `EntityId` can never be confused with an
/// `ItemId` even though both are `u64` underneath. Serialized as the
/// plain inner number (`#[serde(transparent)]`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

/// Identifies one map (one shared world region with its own grid).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MapId(pub u16);

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// Identifies one item instance inside an inventory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Point: a position on a map
// ---------------------------------------------------------------------------

/// A 2-D integer position on a map, in map tiles.
///
/// Maps are small (a few hundred tiles per side), so `u16` covers every
/// real map while keeping a `Point` four bytes wide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    /// Creates a point from its coordinates.
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u16, u16)> for Point {
    fn from((x, y): (u16, u16)) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// MoveType
// ---------------------------------------------------------------------------

/// How an entity got to its new position.
///
/// The AOI engine treats both the same way; observers use it to decide
/// whether to animate a walk or snap the entity into place.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub enum MoveType {
    /// Regular step-by-step movement.
    #[default]
    Walk,
    /// Teleport, warp, knock-back: the entity appears at the target.
    Instant,
}

// ---------------------------------------------------------------------------
// ViewUpdate: what observers receive
// ---------------------------------------------------------------------------

/// Occupancy of one duel slot, as broadcast to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelSlotState {
    /// Slot index in `[0, area_count)`.
    pub index: usize,
    /// The two duelists, or `None` when the slot is free.
    pub participants: Option<(EntityId, EntityId)>,
}

/// A single update pushed to an observer's view.
///
/// Channel-backed sinks receive these as values; the adjacently tagged
/// JSON shape (`{"type": "...", "data": ...}`) is what a connection
/// handler forwards to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ViewUpdate {
    /// These entities are now inside the observer's area of interest.
    EntitiesEntered(Vec<EntityId>),

    /// These entities are no longer inside the observer's area of interest.
    EntitiesLeft(Vec<EntityId>),

    /// An entity the observer already knows about changed position.
    EntityMoved {
        entity: EntityId,
        to: Point,
        move_type: MoveType,
    },

    /// Current occupancy of every duel slot.
    DuelOccupancy(Vec<DuelSlotState>),
}

// =========================================================================
// Tests
// =========================================================================
