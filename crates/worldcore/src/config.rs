//! World configuration, loadable from JSON.
//!
//! ```json
//! {
//!   "maps": [
//!     { "map_id": 1, "width": 512, "height": 512, "bucket_size": 16, "info_range": 2 }
//!   ],
//!   "duel": { "area_count": 4 },
//!   "pool": { "maximum_retained": 8 }
//! }
//! ```
//!
//! Every field has a default, so `{}` is a valid config.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use worldcore_aoi::MapConfig;
use worldcore_duel::DuelConfig;
use worldcore_pool::PoolConfig;

use crate::WorldError;

/// Everything the world is built from. Immutable once the world exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// One entry per map. Map ids must be unique.
    pub maps: Vec<MapConfig>,

    /// Number of duel areas and scoring.
    pub duel: DuelConfig,

    /// Sizing for the helper-object pools created through the world.
    pub pool: PoolConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            maps: vec![MapConfig::default()],
            duel: DuelConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, WorldError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), maps = config.maps.len(), "world config loaded");
        Ok(config)
    }

    /// Rejects configs no world can be built from.
    ///
    /// Values that can be fixed (zero bucket size, zero map size) are
    /// clamped with a warning when the map is built; only structural
    /// problems fail here.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.maps.is_empty() {
            return Err(WorldError::InvalidConfig("no maps configured".into()));
        }
        let mut seen = HashSet::new();
        for map in &self.maps {
            if !seen.insert(map.map_id) {
                return Err(WorldError::InvalidConfig(format!(
                    "map {} configured twice",
                    map.map_id
                )));
            }
        }
        if self.duel.max_score == 0 {
            return Err(WorldError::InvalidConfig("duel.max_score must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldcore_protocol::MapId;

    #[test]
    fn test_empty_json_is_default() {
        let config = WorldConfig::from_json_str("{}").unwrap();
        assert_eq!(config, WorldConfig::default());
    }

    #[test]
    fn test_from_json_str_partial_fields() {
        let config = WorldConfig::from_json_str(
            r#"{
                "maps": [{ "map_id": 3, "bucket_size": 16 }, { "map_id": 4 }],
                "duel": { "area_count": 2 },
                "pool": { "maximum_retained": 6 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.maps.len(), 2);
        assert_eq!(config.maps[0].map_id, MapId(3));
        assert_eq!(config.maps[0].bucket_size, 16);
        assert_eq!(config.maps[0].info_range, 2);
        assert_eq!(config.duel.area_count, 2);
        assert_eq!(config.duel.max_score, 10);
        assert_eq!(config.pool.maximum_retained(), 6);
    }

    #[test]
    fn test_validate_duplicate_map_rejected() {
        let err = WorldConfig::from_json_str(r#"{ "maps": [{ "map_id": 1 }, { "map_id": 1 }] }"#)
            .unwrap_err();
        assert!(matches!(err, WorldError::InvalidConfig(_)));
        assert!(err.to_string().contains("M-1"));
    }

    #[test]
    fn test_validate_no_maps_rejected() {
        let err = WorldConfig::from_json_str(r#"{ "maps": [] }"#).unwrap_err();
        assert!(matches!(err, WorldError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = WorldConfig::from_json_str(r#"{ "maps": 7 }"#).unwrap_err();
        assert!(matches!(err, WorldError::Json(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = WorldConfig::load("/definitely/not/here/world.json").unwrap_err();
        assert!(matches!(err, WorldError::Io(_)));
    }
}
