/*!
 * Types and functions for grouping spawn points into clusters.
 *
 * A cluster is a group of [Spawnpoint](crate::Spawnpoint) observations that are close in both
 * space and time, and so are taken to be the same recurring event.
 */

pub use engine::{check_cluster, cluster, cost, Admission};
pub use spawncluster::Spawncluster;
pub use validate::{validate, validate_all};

pub(crate) use engine::cluster_with_origins;

mod engine;
mod spawncluster;
mod validate;
