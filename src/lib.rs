pub use cluster::{
    check_cluster, cluster, cost, validate, validate_all, Admission, Spawncluster,
};
pub use config::{ClusterConfig, DEFAULT_RADIUS, DEFAULT_TIME_THRESHOLD};
pub use error::{ConfigError, InputError, Invariant, InvariantViolation, SpawnResult};
pub use geo::{distance, intermediate_point, Coord};
pub use kml::{save_kml, KmlFile, KmlWriter};
pub use reduce::{process, process_clusters, reduce, SpawnRow};
pub use shard::{cluster_sharded, partition};
pub use spawnpoint::{
    load_spawnpoints, normalize_records, spawn_time_from_disappear, RawSpawnpoint, Spawnpoint,
    DEFAULT_SPAWN_TIMESPAN,
};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod cluster;
mod config;
mod error;
mod geo;
mod kml;
mod reduce;
mod shard;
mod spawnpoint;

/// Geometry helpers that are handy when building test fixtures.
pub mod geometry {
    pub use crate::geo::{meters_to_lat_degrees, EARTH_RADIUS_M};
}
