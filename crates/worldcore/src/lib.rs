//! # worldcore
//!
//! Concurrency-safe world-state core for real-time multiplayer servers.
//!
//! worldcore keeps the shared state that many concurrent player actions
//! touch at once:
//!
//! - **who sees whom**: a bucket grid per map with area-of-interest
//!   diffing ([`worldcore_aoi`])
//! - **scarce resources**: a bounded, cancellable object pool
//!   ([`worldcore_pool`]) and exclusive indexed slots for duel arenas
//!   ([`worldcore_duel`])
//! - **rollback**: slot/money snapshots for interrupted trades
//!   ([`worldcore_inventory`])
//!
//! It computes no damage, decides no game rules, and speaks no wire
//! protocol; the game server drives it from its action handlers.
//!
//! ## Quick Start
//!
//! ```rust
//! use worldcore::prelude::*;
//!
//! let world = World::new(WorldConfig::default())?;
//! let map = world.map(MapId(0))?;
//! assert!(map.visible_from(Point::new(10, 10)).is_empty());
//! # Ok::<(), WorldError>(())
//! ```

mod config;
mod error;
pub mod telemetry;
mod world;

pub use config::WorldConfig;
pub use error::WorldError;
pub use world::{GameMap, World};

pub use worldcore_aoi as aoi;
pub use worldcore_duel as duel;
pub use worldcore_inventory as inventory;
pub use worldcore_pool as pool;
pub use worldcore_protocol as protocol;

/// Everything an action handler usually needs.
pub mod prelude {
    pub use crate::{GameMap, World, WorldConfig, WorldError};

    pub use worldcore_aoi::{AreaOfInterestManager, Locateable, MapConfig};
    pub use worldcore_duel::{DuelConfig, DuelRoom, DuelRoomManager, DuelState, SlotOutcome};
    pub use worldcore_inventory::{
        BackupItemStorage, Inventory, InventoryTransaction, Item, ItemStorage,
    };
    pub use worldcore_pool::{BoundedResourcePool, CancellationToken, PoolConfig, Pooled};
    pub use worldcore_protocol::{
        EntityId, ItemId, MapId, MoveType, Point, ViewSender, ViewSink, ViewUpdate,
    };
}
