//! Exclusive indexed slots and the duel rooms built on them.
//!
//! # Key types
//!
//! - [`ExclusiveSlotAllocator`]: N interchangeable exclusive resources,
//!   claimed by index
//! - [`SlotResource`]: what lives in a slot
//! - [`SlotOutcome`]: allocated / no slot available / cancelled
//! - [`DuelRoomManager`]: the duel-arena specialization
//! - [`DuelRoom`] and [`DuelState`]: one duel and its lifecycle

mod allocator;
mod config;
mod error;
mod manager;
mod room;

pub use allocator::{ExclusiveSlotAllocator, SlotOutcome, SlotResource};
pub use config::{DuelConfig, DuelState};
pub use error::DuelError;
pub use manager::DuelRoomManager;
pub use room::{DuelParams, DuelRoom};
