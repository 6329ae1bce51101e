//! Map configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;
use worldcore_protocol::MapId;

/// Grid settings for one map.
///
/// Supplied once when the map is built and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Which map this grid belongs to (used in logs).
    pub map_id: MapId,

    /// Map width in tiles.
    pub width: u16,

    /// Map height in tiles.
    pub height: u16,

    /// Side length of one bucket in tiles.
    pub bucket_size: u16,

    /// Interest range of observers, in buckets (Chebyshev distance).
    /// 0 means an observer only sees its own bucket.
    pub info_range: u16,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            map_id: MapId(0),
            width: 256,
            height: 256,
            bucket_size: 8,
            info_range: 2,
        }
    }
}

impl MapConfig {
    /// Creates a default-sized config for the given map.
    pub fn for_map(map_id: MapId) -> Self {
        Self {
            map_id,
            ..Default::default()
        }
    }

    /// Fixes out-of-range values so the config is safe to build a grid from.
    ///
    /// - `bucket_size` of 0 becomes 1.
    /// - `width`/`height` of 0 become 1.
    pub fn validated(mut self) -> Self {
        if self.bucket_size == 0 {
            warn!(map_id = %self.map_id, "bucket_size is 0, using 1");
            self.bucket_size = 1;
        }
        if self.width == 0 || self.height == 0 {
            warn!(
                map_id = %self.map_id,
                width = self.width,
                height = self.height,
                "empty map dimensions, using 1"
            );
            self.width = self.width.max(1);
            self.height = self.height.max(1);
        }
        self
    }

    /// Number of bucket columns.
    pub fn columns(&self) -> u16 {
        self.width.div_ceil(self.bucket_size.max(1))
    }

    /// Number of bucket rows.
    pub fn rows(&self) -> u16 {
        self.height.div_ceil(self.bucket_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_dimensions() {
        let cfg = MapConfig::default();
        assert_eq!(cfg.columns(), 32);
        assert_eq!(cfg.rows(), 32);
    }

    #[test]
    fn test_partial_bucket_rounds_up() {
        let cfg = MapConfig {
            width: 20,
            height: 9,
            bucket_size: 8,
            ..Default::default()
        };
        assert_eq!(cfg.columns(), 3);
        assert_eq!(cfg.rows(), 2);
    }

    #[test]
    fn test_validated_fixes_zero_bucket_size() {
        let cfg = MapConfig {
            bucket_size: 0,
            width: 0,
            ..Default::default()
        }
        .validated();
        assert_eq!(cfg.bucket_size, 1);
        assert_eq!(cfg.width, 1);
    }
}
