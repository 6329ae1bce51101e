//! The bucket grid: fixed-size cells, each behind its own lock.
//!
//! Buckets never point at entities and entities never point at buckets.
//! A bucket stores entity *ids*; the manager stores each entity's bucket
//! *index*. Both collections are owned by the
//! [`AreaOfInterestManager`](crate::AreaOfInterestManager).
//!
//! # Lock ordering
//!
//! Every caller that needs more than one bucket must take them through
//! [`SpatialGrid::read_many`] / [`SpatialGrid::write_many`], which lock in
//! ascending bucket index. With a single global order no two operations
//! can wait on each other in a cycle.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use worldcore_protocol::{EntityId, Point, ViewSink};

use crate::MapConfig;

// ---------------------------------------------------------------------------
// BucketCoord
// ---------------------------------------------------------------------------

/// Column/row of a bucket in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketCoord {
    pub x: u16,
    pub y: u16,
}

impl BucketCoord {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance in buckets.
    pub fn distance(&self, other: &BucketCoord) -> u16 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for BucketCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// One grid cell.
///
/// `members` are the entities positioned inside the cell. `observers` are
/// the observers whose interest range covers the cell, together with the
/// sink their notifications go to.
#[derive(Default)]
pub struct Bucket {
    members: HashSet<EntityId>,
    observers: HashMap<EntityId, Arc<dyn ViewSink>>,
}

impl Bucket {
    /// Entities currently inside this bucket.
    pub fn members(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }

    /// Whether `entity` is inside this bucket.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.members.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Ids of the observers watching this bucket.
    pub fn observer_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.observers.keys().copied()
    }

    pub(crate) fn insert_member(&mut self, entity: EntityId) -> bool {
        self.members.insert(entity)
    }

    pub(crate) fn remove_member(&mut self, entity: EntityId) -> bool {
        self.members.remove(&entity)
    }

    pub(crate) fn subscribe(&mut self, observer: EntityId, sink: Arc<dyn ViewSink>) {
        self.observers.insert(observer, sink);
    }

    pub(crate) fn unsubscribe(&mut self, observer: EntityId) {
        self.observers.remove(&observer);
    }

    /// Observers of this bucket other than `except`.
    pub(crate) fn observers_except(
        &self,
        except: EntityId,
    ) -> impl Iterator<Item = (EntityId, &Arc<dyn ViewSink>)> + '_ {
        self.observers
            .iter()
            .filter(move |(id, _)| **id != except)
            .map(|(id, sink)| (*id, sink))
    }
}

/// Write guards on a set of buckets, keyed by bucket index.
pub(crate) type BucketWriteSet<'a> = BTreeMap<usize, RwLockWriteGuard<'a, Bucket>>;

// ---------------------------------------------------------------------------
// SpatialGrid
// ---------------------------------------------------------------------------

/// A map partitioned into `columns × rows` buckets of `bucket_size` tiles.
///
/// Buckets are created once with the grid and live as long as it does.
pub struct SpatialGrid {
    width: u16,
    height: u16,
    columns: u16,
    rows: u16,
    bucket_size: u16,
    buckets: Vec<RwLock<Bucket>>,
}

impl SpatialGrid {
    /// Builds the grid for a map.
    pub fn new(config: &MapConfig) -> Self {
        let config = config.clone().validated();
        let columns = config.columns();
        let rows = config.rows();
        let buckets = (0..usize::from(columns) * usize::from(rows))
            .map(|_| RwLock::new(Bucket::default()))
            .collect();
        Self {
            width: config.width,
            height: config.height,
            columns,
            rows,
            bucket_size: config.bucket_size,
            buckets,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn bucket_size(&self) -> u16 {
        self.bucket_size
    }

    /// Total number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The bucket containing `point`, or `None` if it lies off the map.
    ///
    /// The last column or row may be a partial bucket; tiles past the map
    /// edge inside it are still off the map.
    pub fn coord_of(&self, point: Point) -> Option<BucketCoord> {
        if point.x >= self.width || point.y >= self.height {
            return None;
        }
        Some(BucketCoord {
            x: point.x / self.bucket_size,
            y: point.y / self.bucket_size,
        })
    }

    pub(crate) fn index_of(&self, coord: BucketCoord) -> usize {
        usize::from(coord.y) * usize::from(self.columns) + usize::from(coord.x)
    }

    pub(crate) fn coord_at(&self, index: usize) -> BucketCoord {
        let columns = usize::from(self.columns);
        BucketCoord {
            x: (index % columns) as u16,
            y: (index / columns) as u16,
        }
    }

    /// Indices of every bucket within `range` of `center`, clipped to the map.
    pub fn neighborhood(&self, center: BucketCoord, range: u16) -> BTreeSet<usize> {
        let min_x = center.x.saturating_sub(range);
        let min_y = center.y.saturating_sub(range);
        let max_x = center.x.saturating_add(range).min(self.columns - 1);
        let max_y = center.y.saturating_add(range).min(self.rows - 1);

        let mut indices = BTreeSet::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                indices.insert(self.index_of(BucketCoord { x, y }));
            }
        }
        indices
    }

    /// Indices of every bucket within `range` of the bucket containing
    /// `point`, clipped to the map.
    ///
    /// `point` may lie off the map: its bucket is computed as if the grid
    /// went on, so only on-map buckets actually within `range` count. Empty
    /// when none are.
    pub fn range_around(&self, point: Point, range: u16) -> BTreeSet<usize> {
        let size = u32::from(self.bucket_size);
        let (cx, cy) = (u32::from(point.x) / size, u32::from(point.y) / size);
        let range = u32::from(range);

        let min_x = cx.saturating_sub(range);
        let min_y = cy.saturating_sub(range);
        let max_x = (cx + range).min(u32::from(self.columns) - 1);
        let max_y = (cy + range).min(u32::from(self.rows) - 1);

        let mut indices = BTreeSet::new();
        if min_x > max_x || min_y > max_y {
            return indices;
        }
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                indices.insert(self.index_of(BucketCoord::new(x as u16, y as u16)));
            }
        }
        indices
    }

    /// Read-locks one bucket.
    pub fn read(&self, coord: BucketCoord) -> RwLockReadGuard<'_, Bucket> {
        self.buckets[self.index_of(coord)].read()
    }

    /// Read-locks a set of buckets in ascending index order.
    pub(crate) fn read_many(&self, indices: &BTreeSet<usize>) -> Vec<RwLockReadGuard<'_, Bucket>> {
        indices.iter().map(|&i| self.buckets[i].read()).collect()
    }

    /// Write-locks a set of buckets in ascending index order.
    pub(crate) fn write_many(&self, indices: &BTreeSet<usize>) -> BucketWriteSet<'_> {
        indices
            .iter()
            .map(|&i| (i, self.buckets[i].write()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_8() -> SpatialGrid {
        SpatialGrid::new(&MapConfig::default())
    }

    #[test]
    fn test_coord_of_divides_by_bucket_size() {
        let grid = grid_8();
        assert_eq!(grid.coord_of(Point::new(0, 0)), Some(BucketCoord::new(0, 0)));
        assert_eq!(grid.coord_of(Point::new(7, 8)), Some(BucketCoord::new(0, 1)));
        assert_eq!(grid.coord_of(Point::new(255, 255)), Some(BucketCoord::new(31, 31)));
    }

    #[test]
    fn test_coord_of_off_map_is_none() {
        let grid = grid_8();
        assert_eq!(grid.coord_of(Point::new(256, 0)), None);
        assert_eq!(grid.coord_of(Point::new(3, 1000)), None);
    }

    #[test]
    fn test_coord_of_partial_bucket_past_edge_is_none() {
        // 3×2 buckets, the last column and row only partly on the map.
        let grid = SpatialGrid::new(&MapConfig {
            width: 20,
            height: 9,
            bucket_size: 8,
            ..Default::default()
        });
        assert_eq!(grid.coord_of(Point::new(19, 8)), Some(BucketCoord::new(2, 1)));
        assert_eq!(grid.coord_of(Point::new(20, 0)), None);
        assert_eq!(grid.coord_of(Point::new(0, 9)), None);
        assert_eq!(grid.coord_of(Point::new(23, 15)), None);
    }

    #[test]
    fn test_range_around_off_map_point() {
        let grid = grid_8();
        // Column 125: far past the last column (31).
        assert!(grid.range_around(Point::new(1000, 3), 0).is_empty());
        assert!(grid.range_around(Point::new(1000, 3), 90).is_empty());
        // Column 33 reaches back to column 31 with range 2.
        let edge = grid.range_around(Point::new(264, 3), 2);
        assert_eq!(
            edge.iter().map(|&i| grid.coord_at(i)).collect::<Vec<_>>(),
            [BucketCoord::new(31, 0), BucketCoord::new(31, 1), BucketCoord::new(31, 2)]
        );
    }

    #[test]
    fn test_range_around_on_map_matches_neighborhood() {
        let grid = grid_8();
        let point = Point::new(100, 7);
        let center = grid.coord_of(point).unwrap();
        assert_eq!(grid.range_around(point, 2), grid.neighborhood(center, 2));
    }

    #[test]
    fn test_index_and_coord_round_trip() {
        let grid = grid_8();
        let coord = BucketCoord::new(5, 17);
        assert_eq!(grid.coord_at(grid.index_of(coord)), coord);
    }

    #[test]
    fn test_neighborhood_range_zero_is_single_bucket() {
        let grid = grid_8();
        let n = grid.neighborhood(BucketCoord::new(4, 4), 0);
        assert_eq!(n.len(), 1);
        assert!(n.contains(&grid.index_of(BucketCoord::new(4, 4))));
    }

    #[test]
    fn test_neighborhood_interior_and_corner() {
        let grid = grid_8();
        assert_eq!(grid.neighborhood(BucketCoord::new(10, 10), 2).len(), 25);
        // Clipped at the corner: x and y in 0..=2.
        assert_eq!(grid.neighborhood(BucketCoord::new(0, 0), 2).len(), 9);
        assert_eq!(grid.neighborhood(BucketCoord::new(31, 31), 1).len(), 4);
    }

    #[test]
    fn test_neighborhood_matches_chebyshev_distance() {
        let grid = grid_8();
        let center = BucketCoord::new(3, 1);
        let n = grid.neighborhood(center, 2);
        for i in 0..grid.len() {
            let coord = grid.coord_at(i);
            assert_eq!(n.contains(&i), coord.distance(&center) <= 2, "{coord}");
        }
    }

    #[test]
    fn test_bucket_membership() {
        let mut bucket = Bucket::default();
        assert!(bucket.insert_member(EntityId(1)));
        assert!(!bucket.insert_member(EntityId(1)));
        assert!(bucket.contains(EntityId(1)));
        assert!(bucket.remove_member(EntityId(1)));
        assert!(bucket.is_empty());
    }
}
