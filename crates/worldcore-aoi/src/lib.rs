//! Area-of-interest tracking for worldcore.
//!
//! A map is cut into fixed-size buckets. Every entity sits in exactly one
//! bucket; every observer watches all buckets within its interest range
//! and is told when entities enter or leave them.
//!
//! # Key types
//!
//! - [`AreaOfInterestManager`]: add/remove/move entities, range queries
//! - [`SpatialGrid`] / [`Bucket`]: the partitioned map
//! - [`Locateable`]: what callers hand to the manager
//! - [`MapConfig`]: grid dimensions and interest range

mod config;
mod error;
mod grid;
mod manager;

pub use config::MapConfig;
pub use error::AoiError;
pub use grid::{Bucket, BucketCoord, SpatialGrid};
pub use manager::{AreaOfInterestManager, Locateable};
