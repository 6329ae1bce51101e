//! Shared value types for worldcore.
//!
//! This crate defines the vocabulary every other layer speaks:
//!
//! - **Identity** ([`EntityId`], [`MapId`], [`ItemId`]): newtypes so ids of
//!   different kinds can't be mixed up.
//! - **Geometry** ([`Point`], [`MoveType`]): where things are and how they
//!   got there.
//! - **View updates** ([`ViewUpdate`], [`ViewSink`]): what observers are
//!   told when their area of interest changes.
//!
//! # Architecture
//!
//! ```text
//! AOI / Duel / Pool / Inventory  →  Protocol (ids, points, ViewUpdate)
//! ```
//!
//! The protocol layer holds no state; it only describes it.

mod sink;
mod types;

pub use sink::{ViewSender, ViewSink};
pub use types::{
    DuelSlotState, EntityId, ItemId, MapId, MoveType, Point, ViewUpdate,
};
