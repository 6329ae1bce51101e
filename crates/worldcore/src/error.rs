//! Unified error type for worldcore.

use worldcore_aoi::AoiError;
use worldcore_duel::DuelError;
use worldcore_inventory::InventoryError;
use worldcore_pool::PoolError;
use worldcore_protocol::MapId;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `worldcore` facade you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An area-of-interest error (unknown or duplicate entity, off-map).
    #[error(transparent)]
    Aoi(#[from] AoiError),

    /// A pool error (cancelled, closed).
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A duel error (self duel, already dueling, invalid state).
    #[error(transparent)]
    Duel(#[from] DuelError),

    /// An inventory error (slot occupied, insufficient money).
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// No map with this id is loaded.
    #[error("map {0} is not loaded")]
    UnknownMap(MapId),

    /// The configuration is structurally wrong.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The config file could not be read.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for [`WorldConfig`](crate::WorldConfig).
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldcore_protocol::EntityId;

    #[test]
    fn test_from_aoi_error() {
        let err = AoiError::NotRegistered(EntityId(4));
        let world_err: WorldError = err.into();
        assert!(matches!(world_err, WorldError::Aoi(_)));
        assert!(world_err.to_string().contains("E-4"));
    }

    #[test]
    fn test_from_pool_error() {
        let world_err: WorldError = PoolError::Cancelled.into();
        assert!(matches!(world_err, WorldError::Pool(PoolError::Cancelled)));
        assert_eq!(world_err.to_string(), "acquisition cancelled");
    }

    #[test]
    fn test_from_duel_error() {
        let world_err: WorldError = DuelError::SelfDuel(EntityId(1)).into();
        assert!(matches!(world_err, WorldError::Duel(_)));
    }

    #[test]
    fn test_from_inventory_error() {
        let err = InventoryError::InsufficientMoney {
            required: 10,
            available: 0,
        };
        let world_err: WorldError = err.into();
        assert!(matches!(world_err, WorldError::Inventory(_)));
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let world_err: WorldError = err.into();
        assert!(world_err.to_string().starts_with("config json:"));
    }
}
