//! The world: every loaded map, the duel arenas, and pool sizing.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use worldcore_aoi::{AreaOfInterestManager, Locateable, MapConfig};
use worldcore_duel::DuelRoomManager;
use worldcore_pool::{BoundedResourcePool, PoolConfig, PoolPolicy};
use worldcore_protocol::{EntityId, MapId, MoveType, Point, ViewSink};

use crate::{WorldConfig, WorldError};

// ---------------------------------------------------------------------------
// GameMap
// ---------------------------------------------------------------------------

/// One map and its area-of-interest grid.
///
/// Derefs to the [`AreaOfInterestManager`], so the full AOI API is
/// available directly on the map.
pub struct GameMap {
    config: MapConfig,
    aoi: AreaOfInterestManager,
}

impl GameMap {
    pub fn new(config: MapConfig) -> Self {
        let config = config.validated();
        let aoi = AreaOfInterestManager::new(config.clone());
        Self { config, aoi }
    }

    pub fn id(&self) -> MapId {
        self.config.map_id
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn aoi(&self) -> &AreaOfInterestManager {
        &self.aoi
    }

    /// Entities an observer standing at `point` can see, using the map's
    /// configured interest range.
    pub fn visible_from(&self, point: Point) -> Vec<EntityId> {
        self.aoi.get_in_range(point, self.config.info_range)
    }
}

impl Deref for GameMap {
    type Target = AreaOfInterestManager;

    fn deref(&self) -> &AreaOfInterestManager {
        &self.aoi
    }
}

/// An entity seen at a different position, with the same id and view.
struct Relocated<'a, L> {
    entity: &'a L,
    position: Point,
}

impl<L: Locateable> Locateable for Relocated<'_, L> {
    fn id(&self) -> EntityId {
        self.entity.id()
    }

    fn position(&self) -> Point {
        self.position
    }

    fn view(&self) -> Option<Arc<dyn ViewSink>> {
        self.entity.view()
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The shared world state a game server's action handlers work against.
///
/// Built once from a [`WorldConfig`]; the set of maps and the number of
/// duel areas are fixed afterwards. `World` is `Sync`: share it behind an
/// `Arc` and call it from any task.
pub struct World {
    maps: BTreeMap<MapId, GameMap>,
    duels: DuelRoomManager,
    pool_config: PoolConfig,
}

impl World {
    /// Validates `config` and builds every map.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let maps = config
            .maps
            .into_iter()
            .map(|map| (map.map_id, GameMap::new(map)))
            .collect::<BTreeMap<_, _>>();
        tracing::info!(maps = maps.len(), duel_areas = config.duel.area_count, "world created");
        Ok(Self {
            maps,
            duels: DuelRoomManager::new(config.duel),
            pool_config: config.pool,
        })
    }

    /// The map with this id.
    pub fn map(&self, id: MapId) -> Result<&GameMap, WorldError> {
        self.maps.get(&id).ok_or(WorldError::UnknownMap(id))
    }

    /// Every loaded map, ordered by id.
    pub fn maps(&self) -> impl Iterator<Item = &GameMap> + '_ {
        self.maps.values()
    }

    pub fn duels(&self) -> &DuelRoomManager {
        &self.duels
    }

    /// Places an entity on a map.
    pub fn enter(&self, map_id: MapId, entity: &impl Locateable) -> Result<(), WorldError> {
        self.map(map_id)?.add_object(entity)?;
        Ok(())
    }

    /// Takes an entity off a map.
    pub fn leave(&self, map_id: MapId, id: EntityId) -> Result<(), WorldError> {
        self.map(map_id)?.remove_object(id)?;
        Ok(())
    }

    /// Moves an entity within a map.
    pub fn move_entity(
        &self,
        map_id: MapId,
        id: EntityId,
        target: Point,
        move_type: MoveType,
    ) -> Result<(), WorldError> {
        self.map(map_id)?.move_object(id, target, move_type)?;
        Ok(())
    }

    /// Moves an entity from one map to another (portal, warp scroll).
    ///
    /// `entity.position()` must already be its position on the destination
    /// map. The destination and position are checked before the entity is
    /// taken off the source map, so a bad target leaves it where it was.
    pub fn transfer(
        &self,
        entity: &impl Locateable,
        from: MapId,
        to: MapId,
    ) -> Result<(), WorldError> {
        let id = entity.id();
        let source = self.map(from)?;
        let destination = self.map(to)?;
        let position = entity.position();
        if destination.bucket_of(position).is_none() {
            return Err(worldcore_aoi::AoiError::OutOfBounds {
                entity: id,
                point: position,
            }
            .into());
        }
        if destination.contains(id) {
            return Err(worldcore_aoi::AoiError::AlreadyRegistered(id).into());
        }

        Self::relocate(entity, source, destination)?;
        tracing::info!(entity_id = %id, %from, %to, "entity changed map");
        Ok(())
    }

    /// Takes `entity` off `source` and places it on `destination`. If the
    /// destination refuses it (someone claimed the id meanwhile), the
    /// entity goes back to its old position on `source`.
    fn relocate(
        entity: &impl Locateable,
        source: &GameMap,
        destination: &GameMap,
    ) -> Result<(), WorldError> {
        let id = entity.id();
        let previous = source.position_of(id)?;
        source.remove_object(id)?;

        if let Err(err) = destination.add_object(entity) {
            tracing::warn!(
                entity_id = %id,
                from = %source.id(),
                to = %destination.id(),
                error = %err,
                "transfer refused, restoring entity"
            );
            source.add_object(&Relocated {
                entity,
                position: previous,
            })?;
            return Err(err.into());
        }
        Ok(())
    }

    /// Builds a pool sized by the world's pool config.
    pub fn resource_pool<T: Send + 'static>(
        &self,
        name: impl Into<String>,
        policy: impl PoolPolicy<T>,
    ) -> BoundedResourcePool<T> {
        BoundedResourcePool::new(name, &self.pool_config, policy)
    }

    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }
}
