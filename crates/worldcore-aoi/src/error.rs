//! Error types for the AOI layer.

use worldcore_protocol::{EntityId, Point};

/// Errors returned by [`AreaOfInterestManager`](crate::AreaOfInterestManager).
///
/// Every variant is a caller contract violation, not a transient failure:
/// retrying the same call will fail the same way.
#[derive(Debug, thiserror::Error)]
pub enum AoiError {
    /// The entity was never added, or has already been removed.
    #[error("entity {0} is not registered on this map")]
    NotRegistered(EntityId),

    /// An entity with this id is already on the map.
    #[error("entity {0} is already registered on this map")]
    AlreadyRegistered(EntityId),

    /// The position lies outside the map.
    #[error("position {point} of entity {entity} is outside the map")]
    OutOfBounds { entity: EntityId, point: Point },
}
