//! Area-of-interest manager: who can see whom.
//!
//! Entities live in buckets; observers subscribe to every bucket within
//! their interest range. Membership changes in a bucket are fanned out to
//! the observers subscribed to it, and an observer that moves diffs its
//! old and new neighborhoods to learn which entities appeared and which
//! disappeared.
//!
//! # Concurrency
//!
//! - Each entity has its own state mutex. Every operation on an entity
//!   holds it for the whole call, so two moves of the same entity never
//!   interleave. Unrelated entities are not serialized against each other.
//! - Each operation write-locks *every* bucket it reads or changes (old and
//!   new bucket, plus the vacated and entered neighborhood for observers)
//!   before touching any of them, and keeps them until all notifications
//!   are delivered. Range queries read-lock their buckets the same way, so
//!   a move is atomic to them: an entity is never seen in two buckets or
//!   in none.
//! - Lock order: entity state first, then buckets in ascending index.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use worldcore_protocol::{EntityId, MapId, MoveType, Point, ViewSink};

use crate::grid::BucketWriteSet;
use crate::{AoiError, BucketCoord, MapConfig, SpatialGrid};

/// Something with an identity and a position that can be placed on a map.
///
/// Observers additionally return a sink from [`view`](Self::view); plain
/// entities (monsters, dropped items) return `None` and never receive
/// notifications.
pub trait Locateable {
    fn id(&self) -> EntityId;

    fn position(&self) -> Point;

    /// Where this entity's view updates go, if it observes at all.
    fn view(&self) -> Option<Arc<dyn ViewSink>> {
        None
    }
}

struct EntityEntry {
    view: Option<Arc<dyn ViewSink>>,
    state: Mutex<EntityState>,
}

struct EntityState {
    position: Point,
    bucket: usize,
    /// Buckets this entity observes. Empty for non-observers.
    observed: BTreeSet<usize>,
    /// Cleared on removal, so a caller still holding the entry sees it gone.
    registered: bool,
}

/// Tracks entity positions on one map and keeps observers informed.
pub struct AreaOfInterestManager {
    map_id: MapId,
    info_range: u16,
    grid: SpatialGrid,
    entities: RwLock<HashMap<EntityId, Arc<EntityEntry>>>,
}

impl AreaOfInterestManager {
    /// Builds the grid for `config`. All buckets start empty.
    pub fn new(config: MapConfig) -> Self {
        let config = config.validated();
        let grid = SpatialGrid::new(&config);
        tracing::info!(
            map_id = %config.map_id,
            columns = grid.columns(),
            rows = grid.rows(),
            info_range = config.info_range,
            "area of interest grid created"
        );
        Self {
            map_id: config.map_id,
            info_range: config.info_range,
            grid,
            entities: RwLock::new(HashMap::new()),
        }
    }

    pub fn map_id(&self) -> MapId {
        self.map_id
    }

    pub fn info_range(&self) -> u16 {
        self.info_range
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Places an entity on the map.
    ///
    /// Observers of the target bucket are told it entered. If the entity
    /// is itself an observer it subscribes to its neighborhood and receives
    /// everything already there as one batch.
    pub fn add_object(&self, entity: &impl Locateable) -> Result<(), AoiError> {
        let id = entity.id();
        let position = entity.position();
        let coord = self.grid.coord_of(position).ok_or_else(|| {
            tracing::error!(map_id = %self.map_id, entity_id = %id, %position, "add outside map");
            AoiError::OutOfBounds { entity: id, point: position }
        })?;
        let bucket = self.grid.index_of(coord);

        let entry = Arc::new(EntityEntry {
            view: entity.view(),
            state: Mutex::new(EntityState {
                position,
                bucket,
                observed: BTreeSet::new(),
                registered: false,
            }),
        });
        // Hold the state before publishing the entry, so nobody can act on
        // it until it is placed.
        let mut state = entry.state.lock();
        {
            let mut entities = self.entities.write();
            if entities.contains_key(&id) {
                tracing::error!(map_id = %self.map_id, entity_id = %id, "duplicate add");
                return Err(AoiError::AlreadyRegistered(id));
            }
            entities.insert(id, Arc::clone(&entry));
        }

        let neighborhood = match entry.view {
            Some(_) => self.grid.neighborhood(coord, self.info_range),
            None => BTreeSet::new(),
        };
        let mut lock_set = neighborhood.clone();
        lock_set.insert(bucket);
        let mut buckets = self.grid.write_many(&lock_set);

        Self::enter_bucket(&mut buckets, bucket, id);

        if let Some(sink) = &entry.view {
            let visible = Self::subscribe(&mut buckets, &neighborhood, id, sink);
            if !visible.is_empty() {
                sink.entities_entered(&visible);
            }
        }

        state.observed = neighborhood;
        state.registered = true;
        drop(buckets);

        tracing::debug!(
            map_id = %self.map_id,
            entity_id = %id,
            %position,
            bucket = %coord,
            observer = entry.view.is_some(),
            "entity added"
        );
        Ok(())
    }

    /// Takes an entity off the map.
    ///
    /// Observers of its bucket are told it left. An observer is
    /// unsubscribed from every bucket it watched.
    pub fn remove_object(&self, id: EntityId) -> Result<(), AoiError> {
        let entry = self.entry(id)?;
        let mut state = entry.state.lock();
        if !state.registered {
            return Err(self.not_registered(id));
        }

        let mut lock_set = state.observed.clone();
        lock_set.insert(state.bucket);
        let mut buckets = self.grid.write_many(&lock_set);

        Self::leave_bucket(&mut buckets, state.bucket, id);
        for index in &state.observed {
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.unsubscribe(id);
            }
        }

        state.observed.clear();
        state.registered = false;
        drop(buckets);
        drop(state);

        self.entities.write().remove(&id);
        tracing::debug!(map_id = %self.map_id, entity_id = %id, "entity removed");
        Ok(())
    }

    /// Moves an entity to `target`.
    ///
    /// Within the same bucket only the stored position changes (observers
    /// of the bucket get an `entity_moved`). Across buckets:
    ///
    /// 1. observers of the old bucket only are told it left,
    /// 2. observers of both buckets are told it moved,
    /// 3. observers of the new bucket only are told it entered,
    /// 4. if the entity observes, it receives one batch of entities now out
    ///    of scope followed by one batch of entities now in scope.
    ///
    /// All "left" notifications precede all "entered" ones.
    pub fn move_object(
        &self,
        id: EntityId,
        target: Point,
        move_type: MoveType,
    ) -> Result<(), AoiError> {
        let entry = self.entry(id)?;
        let mut state = entry.state.lock();
        if !state.registered {
            return Err(self.not_registered(id));
        }

        let coord = self.grid.coord_of(target).ok_or_else(|| {
            tracing::error!(map_id = %self.map_id, entity_id = %id, %target, "move outside map");
            AoiError::OutOfBounds { entity: id, point: target }
        })?;
        let old_bucket = state.bucket;
        let new_bucket = self.grid.index_of(coord);

        if old_bucket == new_bucket {
            let bucket = self.grid.read(coord);
            for (_, sink) in bucket.observers_except(id) {
                sink.entity_moved(id, target, move_type);
            }
            state.position = target;
            tracing::trace!(map_id = %self.map_id, entity_id = %id, %target, "moved within bucket");
            return Ok(());
        }

        let new_neighborhood = match entry.view {
            Some(_) => self.grid.neighborhood(coord, self.info_range),
            None => BTreeSet::new(),
        };
        let mut lock_set: BTreeSet<usize> =
            state.observed.union(&new_neighborhood).copied().collect();
        lock_set.insert(old_bucket);
        lock_set.insert(new_bucket);
        let mut buckets = self.grid.write_many(&lock_set);

        // Membership first, then the fan-out to other observers.
        if let Some(bucket) = buckets.get_mut(&old_bucket) {
            bucket.remove_member(id);
        }
        if let Some(bucket) = buckets.get_mut(&new_bucket) {
            bucket.insert_member(id);
        }
        Self::notify_transfer(&buckets, old_bucket, new_bucket, id, target, move_type);

        // Then the entity's own view, if it has one.
        if let Some(sink) = &entry.view {
            let vacated: BTreeSet<usize> =
                state.observed.difference(&new_neighborhood).copied().collect();
            let entered: BTreeSet<usize> =
                new_neighborhood.difference(&state.observed).copied().collect();

            let mut out_of_scope = Vec::new();
            for index in &vacated {
                if let Some(bucket) = buckets.get_mut(index) {
                    bucket.unsubscribe(id);
                    out_of_scope.extend(bucket.members().filter(|m| *m != id));
                }
            }
            if !out_of_scope.is_empty() {
                sink.entities_left(&out_of_scope);
            }

            let in_scope = Self::subscribe(&mut buckets, &entered, id, sink);
            if !in_scope.is_empty() {
                sink.entities_entered(&in_scope);
            }

            tracing::trace!(
                map_id = %self.map_id,
                entity_id = %id,
                left = out_of_scope.len(),
                entered = in_scope.len(),
                "observer neighborhood updated"
            );
        }

        state.position = target;
        state.bucket = new_bucket;
        state.observed = new_neighborhood;
        drop(buckets);

        tracing::trace!(
            map_id = %self.map_id,
            entity_id = %id,
            %target,
            bucket = %coord,
            ?move_type,
            "moved to new bucket"
        );
        Ok(())
    }

    /// Every entity in buckets within `range` buckets of the bucket
    /// containing `point`, sorted by id. A point off the map only sees the
    /// on-map buckets that are actually within `range` of it.
    pub fn get_in_range(&self, point: Point, range: u16) -> Vec<EntityId> {
        let indices = self.grid.range_around(point, range);
        let buckets = self.grid.read_many(&indices);

        let mut found: Vec<EntityId> = buckets.iter().flat_map(|b| b.members()).collect();
        drop(buckets);
        found.sort_unstable();
        found
    }

    /// The stored position of an entity.
    pub fn position_of(&self, id: EntityId) -> Result<Point, AoiError> {
        let entry = self.entry(id)?;
        let state = entry.state.lock();
        Ok(state.position)
    }

    /// Buckets the entity currently observes, in ascending index order.
    /// Empty for non-observers.
    pub fn observed_buckets(&self, id: EntityId) -> Result<Vec<BucketCoord>, AoiError> {
        let entry = self.entry(id)?;
        let state = entry.state.lock();
        Ok(state
            .observed
            .iter()
            .map(|&i| self.grid.coord_at(i))
            .collect())
    }

    /// The bucket a point falls into, if it is on the map.
    pub fn bucket_of(&self, point: Point) -> Option<BucketCoord> {
        self.grid.coord_of(point)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.read().contains_key(&id)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    // -- internals ---------------------------------------------------------

    fn entry(&self, id: EntityId) -> Result<Arc<EntityEntry>, AoiError> {
        self.entities
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| self.not_registered(id))
    }

    fn not_registered(&self, id: EntityId) -> AoiError {
        tracing::error!(map_id = %self.map_id, entity_id = %id, "entity not registered");
        AoiError::NotRegistered(id)
    }

    /// Adds `id` to a bucket and tells the bucket's observers.
    fn enter_bucket(buckets: &mut BucketWriteSet<'_>, index: usize, id: EntityId) {
        if let Some(bucket) = buckets.get_mut(&index) {
            bucket.insert_member(id);
            for (_, sink) in bucket.observers_except(id) {
                sink.entities_entered(&[id]);
            }
        }
    }

    /// Removes `id` from a bucket and tells the bucket's observers.
    fn leave_bucket(buckets: &mut BucketWriteSet<'_>, index: usize, id: EntityId) {
        if let Some(bucket) = buckets.get_mut(&index) {
            bucket.remove_member(id);
            for (_, sink) in bucket.observers_except(id) {
                sink.entities_left(&[id]);
            }
        }
    }

    /// Notifies other observers of an entity crossing from `from` to `to`.
    fn notify_transfer(
        buckets: &BucketWriteSet<'_>,
        from: usize,
        to: usize,
        id: EntityId,
        target: Point,
        move_type: MoveType,
    ) {
        let (Some(old), Some(new)) = (buckets.get(&from), buckets.get(&to)) else {
            return;
        };

        for (observer, sink) in old.observers_except(id) {
            if new.observer_ids().all(|o| o != observer) {
                sink.entities_left(&[id]);
            }
        }
        for (observer, sink) in old.observers_except(id) {
            if new.observer_ids().any(|o| o == observer) {
                sink.entity_moved(id, target, move_type);
            }
        }
        for (observer, sink) in new.observers_except(id) {
            if old.observer_ids().all(|o| o != observer) {
                sink.entities_entered(&[id]);
            }
        }
    }

    /// Subscribes an observer to `indices` and returns the entities found
    /// there (excluding the observer itself).
    fn subscribe(
        buckets: &mut BucketWriteSet<'_>,
        indices: &BTreeSet<usize>,
        id: EntityId,
        sink: &Arc<dyn ViewSink>,
    ) -> Vec<EntityId> {
        let mut visible = Vec::new();
        for index in indices {
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.subscribe(id, Arc::clone(sink));
                visible.extend(bucket.members().filter(|m| *m != id));
            }
        }
        visible
    }
}
